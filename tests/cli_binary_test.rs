use std::process::Command;

fn captioneer() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_captioneer"));
    for (name, _) in std::env::vars() {
        if name.starts_with("CAPTIONEER_") {
            command.env_remove(name);
        }
    }
    command
}

#[test]
fn test_version_flag() {
    let output = captioneer()
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    assert!(
        output.status.success(),
        "Version flag should exit with code 0"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version_part = stdout.trim().strip_prefix("captioneer ").unwrap_or("");
    assert_eq!(version_part, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_help_lists_commands() {
    let output = captioneer().arg("--help").output().expect("Failed to execute binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["ask", "describe-stream-batch", "scale-test", "health"] {
        assert!(stdout.contains(command), "help should mention {}", command);
    }
}

#[test]
fn test_unknown_command_exits_with_usage() {
    let output = captioneer().arg("paint").output().expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command 'paint'"));
    assert!(stderr.contains("Usage:"));
}

#[test]
fn test_health_against_unreachable_backend() {
    let output = captioneer()
        .args(["health", "--url", "http://127.0.0.1:1"])
        .output()
        .expect("Failed to execute binary");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Backend not healthy"));
}

#[test]
fn test_missing_image_fails() {
    let output = captioneer()
        .args(["describe", "-i", "/no/such/image.png", "--url", "http://127.0.0.1:1"])
        .output()
        .expect("Failed to execute binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load image"));
}

#[tokio::test]
async fn test_stream_image_writes_html_file() {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/describeimagestream"))
        .and(body_string_contains("filename=\"cat.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"response\":\"A **cat**\"}\n{\"response\":\" on a mat.\"}\n",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("cat.png");
    std::fs::write(&image, b"not really a png").unwrap();
    let out = dir.path().join("answer.html");

    let mut command = tokio::process::Command::from(captioneer());
    let output = command
        .arg("stream")
        .arg("--url")
        .arg(mock_server.uri())
        .arg("-i")
        .arg(&image)
        .arg("-o")
        .arg(&out)
        .output()
        .await
        .expect("Failed to execute binary");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let html = std::fs::read_to_string(&out).unwrap();
    assert_eq!(html, "<p>A <strong>cat</strong> on a mat.</p>\n");
}
