use std::process::{Command, Output};

use tempfile::tempdir;

use crate::support::{Reply, spawn_origin};

fn run_loadwire(args: &[&str]) -> Result<Output, String> {
    Command::new(env!("CARGO_BIN_EXE_loadwire"))
        .args(args)
        .env("LOADWIRE_LOG", "error")
        .output()
        .map_err(|err| format!("run loadwire failed: {}", err))
}

fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn probe_reports_summary() -> Result<(), String> {
    let origin = spawn_origin(Reply::status(200))?;
    let url = origin.url("/probe");
    for transport in ["pooled", "standard"] {
        let output = run_loadwire(&["-u", &url, "-n", "3", "--transport", transport])?;
        if !output.status.success() {
            return Err(describe(&output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.contains("completed=3 failed=0") {
            return Err(describe(&output));
        }
    }
    Ok(())
}

#[test]
fn probe_reads_config_file() -> Result<(), String> {
    let origin = spawn_origin(Reply::status(404))?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("probe.toml");
    let content = format!(
        "url = \"{}\"\nmethod = \"DELETE\"\nheaders = [\"X-Probe: yes\"]\n",
        origin.url("/things/1")
    );
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    let path = path.to_string_lossy().into_owned();

    let output = run_loadwire(&["--config", &path])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    // A 404 still counts as a completed exchange.
    if !String::from_utf8_lossy(&output.stdout).contains("completed=1 failed=0") {
        return Err(describe(&output));
    }
    let requests = origin.requests();
    let request = requests.first().ok_or("no request recorded")?;
    if request.method != "DELETE" || request.header("x-probe") != Some("yes") {
        return Err(format!("unexpected request {:?}", request));
    }
    Ok(())
}

#[test]
fn probe_fails_on_invalid_url() -> Result<(), String> {
    let output = run_loadwire(&["-u", "ftp://example.test/"])?;
    if output.status.success() {
        return Err(describe(&output));
    }
    Ok(())
}
