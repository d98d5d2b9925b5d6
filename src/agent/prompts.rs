//! Prompt text sent to the reasoning service.

use std::fmt::Write;

use crate::config::ScanPolicy;
use crate::scheduler::{ScanTask, ScanType};

/// System message opening every conversation.
pub fn system_prompt(task: &ScanTask, policy: &ScanPolicy, corpus_size: usize) -> String {
    let request = &task.request;
    let mut p = String::new();

    p.push_str("You are an expert penetration tester with authorization to test the target system.\n");
    p.push_str("Your task is to analyze HTTP requests and identify security vulnerabilities.\n\n");

    p.push_str("**Target Information:**\n");
    let _ = writeln!(p, "- URL: {}", request.url());
    let _ = writeln!(p, "- Method: {}", request.method());
    let _ = writeln!(p, "- Scan Type: {}\n", task.scan_type);

    p.push_str("**Scan Types Enabled:**\n");
    for class in policy.enabled_classes() {
        let _ = writeln!(p, "- {}", class);
    }
    p.push('\n');

    p.push_str("**Agent Parameters:**\n");
    let _ = writeln!(p, "- Max Iterations: {}", policy.max_iterations);
    let _ = writeln!(p, "- Confidence Level: {}\n", policy.confidence_level);

    if let Some(custom) = &task.custom_prompt {
        p.push_str("**Custom Instruction:**\n");
        let _ = writeln!(p, "{}\n", custom);
    }

    p.push_str(INSTRUCTIONS);
    p.push_str(OUTPUT_CONTRACT);
    p.push_str(&scan_type_guidelines(task.scan_type, corpus_size));

    p.push_str("\n**Original Request:**\n");
    p.push_str(&request.format_for_llm());
    p
}

/// User message carrying the result of one probe back to the reasoning service.
pub fn observation_prompt(transcript: &str, observation: &str, iteration: u32) -> String {
    format!(
        "**Previous Thoughts:**\n{}\n\n**Observation #{}:**\n{}\n\n{}",
        transcript, iteration, observation, ANALYSIS_HINT
    )
}

const INSTRUCTIONS: &str = "**Instructions:**\n\
1. Carefully analyze the HTTP request structure and identify potential injection points.\n\
2. Look for suspicious parameters, file uploads, headers, or data patterns.\n\
3. If you want to perform a test, output a JSON object with \"action\": \"send_request\".\n\
4. If you believe you have found a vulnerability, output \"action\": \"finish\" with evidence.\n\
5. If the target appears secure after analysis, output \"action\": \"finish\" with vulnerability_found: false.\n\
6. Do NOT provide explanations outside the JSON structure.\n\
7. Be precise and technical in your analysis.\n\
8. Your first send_request is answered with the unmodified original request as a baseline.\n\n";

const OUTPUT_CONTRACT: &str = r#"**Output Format (MUST be valid JSON):**
{
  "thought": "Your reasoning process",
  "action": "send_request" | "finish",
  "request_modification": {  // Only if action is "send_request"
    "type": "url_query" | "url_path" | "post_body" | "json" | "header" | "cookie" | "raw_body" | "file_upload",
    "parameter": "name of the parameter, header or cookie",
    "value": "payload (\"auto\" with file_upload draws the next built-in upload payload)",
    "encoding": "none" | "url_encode" | "url_decode" | "base64" | "base64_decode" | "html_entity"
  },
  "vulnerability_found": true | false,  // Only if action is "finish"
  "vulnerability_type": "...",  // Only if vulnerability found
  "severity": "Low|Medium|High|Critical",  // Only if vulnerability found
  "evidence": "...",  // Only if vulnerability found
  "remediation": "..."  // Only if vulnerability found
}

"#;

const ANALYSIS_HINT: &str = "**Analysis Hint:**\n\
Compare this response with the original baseline response.\n\
Look for:\n\
- Error messages or stack traces\n\
- Timing differences (for blind injection)\n\
- Content length changes (for boolean-based attacks)\n\
- Reflected payloads (for XSS/injection)\n\
- File upload acceptance/rejection patterns\n\
- Status code changes\n\n\
Continue your analysis or provide a final conclusion.";

fn scan_type_guidelines(scan_type: ScanType, corpus_size: usize) -> String {
    let mut s = String::new();

    if scan_type.covers(ScanType::FileUpload) {
        s.push_str("\n**File Upload Testing Guidelines:**\n");
        s.push_str("When testing file upload functionality, pay attention to:\n");
        for item in [
            "File extension validation bypass techniques",
            "MIME type spoofing",
            "Double extensions (e.g., .php.jpg)",
            "Null byte injection",
            "Magic header manipulation (GIF89a, etc.)",
            ".htaccess or web.config upload",
            "Polyglot files (valid image + malicious code)",
            "Special character bypasses",
            "Unicode bypass techniques",
            "Archive upload exploits (zip, tar, rar)",
        ] {
            let _ = writeln!(s, "- {}", item);
        }
        s.push_str("\n**Test these file upload payloads systematically:**\n");
        let _ = writeln!(s, "You should test {} different payload types:", corpus_size);
        s.push_str(
            "\n1. Web Shells: PHP, JSP, ASPX, ASP\n\
             2. Image-Embedded: GIF/JPEG/PNG headers with code\n\
             3. Double Extensions: .php.jpg, .shell.php5, etc.\n\
             4. Null Byte Injection: file.php%00.jpg\n\
             5. .htaccess Attacks: Force execution of images as code\n\
             6. Config Injection: web.config, .user.ini\n\
             7. MIME Spoofing: PHP code with image MIME type\n\
             8. Special Characters: Trailing dots, spaces, ::DATA\n\
             9. Unicode Bypass: Non-standard characters\n\
             10. XXE via XML: SVG with external entity\n\
             11. SSRF via Upload: SVG with internal requests\n\
             12. Archive Exploits: ZIP/TAR with embedded shell\n",
        );
    }

    let sections: [(ScanType, &str, &[&str]); 4] = [
        (
            ScanType::SqlInjection,
            "SQL Injection",
            &[
                "Error messages containing database keywords (MySQL, PostgreSQL, MSSQL, Oracle)",
                "Time-based delays in response (SLEEP(), WAITFOR DELAY)",
                "Boolean-based logic differences (AND 1=1 vs AND 1=2)",
                "Union-based injection possibilities",
                "Stacked queries",
                "Blind injection techniques",
            ],
        ),
        (
            ScanType::Xss,
            "XSS",
            &[
                "Reflected input in HTML context without encoding",
                "JavaScript execution context",
                "Event handlers (onerror, onload, onmouseover, etc.)",
                "DOM manipulation possibilities",
                "Tag-based injections (<script>, <img>, <svg>, <body>, etc.)",
                "Attribute-based injections (onload=, onerror=)",
            ],
        ),
        (
            ScanType::Idor,
            "IDOR",
            &[
                "Sequential IDs in URLs or parameters",
                "Predictable resource identifiers (UUIDs, emails, usernames)",
                "Missing authorization checks",
                "Response contains data of other users",
                "Access control bypass attempts",
            ],
        ),
        (
            ScanType::Ssrf,
            "SSRF",
            &[
                "URL parameters accepting external addresses",
                "Internal IP addresses in responses",
                "Cloud metadata endpoints accessibility",
                "DNS resolution behavior changes",
                "File scheme access (file://)",
                "Internal service discovery",
            ],
        ),
    ];

    for (kind, title, indicators) in sections {
        if !scan_type.covers(kind) {
            continue;
        }
        let _ = writeln!(s, "\n**{} Testing Guidelines:**", title);
        s.push_str("Focus on these indicators:\n");
        for indicator in indicators {
            let _ = writeln!(s, "- {}", indicator);
        }
    }

    s
}
