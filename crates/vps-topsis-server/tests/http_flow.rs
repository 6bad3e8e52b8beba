use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn reserve_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve addr");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr.to_string()
}

fn wait_for_http(addr: &str) {
    for _ in 0..80 {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on {addr}");
}

fn send_http(addr: &str, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

fn response_body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

fn response_header(response: &str) -> &str {
    response.split("\r\n\r\n").next().unwrap_or("")
}

#[test]
fn http_catalog_calculate_and_metrics_work() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let dir = std::env::temp_dir();
    let catalog = dir.join(format!("vps-topsis-http-{now}-catalog.json"));
    let history = dir.join(format!("vps-topsis-http-{now}-history.json"));
    let addr = reserve_addr();

    let mut child = Command::new(env!("CARGO_BIN_EXE_vps-topsisd"))
        .env("VPS_TOPSISD_TRANSPORT", "http")
        .env("VPS_TOPSIS_HTTP_ADDR", &addr)
        .env("VPS_TOPSIS_CATALOG", &catalog)
        .env("VPS_TOPSIS_HISTORY", &history)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn vps-topsisd");

    wait_for_http(&addr);

    let health = send_http(&addr, "GET", "/health", "");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(response_header(&health).contains("Content-Type: application/json"));
    assert!(response_body(&health).contains("\"status\":\"ok\""));

    let empty = send_http(
        &addr,
        "POST",
        "/api/calculate",
        r#"{"cpu":0.25,"ram":0.25,"disk":0.25,"price":0.25}"#,
    );
    assert!(empty.starts_with("HTTP/1.1 400"));
    assert!(response_body(&empty).contains("\"invalid_matrix\""));

    for body in [
        r#"{"vendor":"Hetzner","nama_paket":"CX22","cpu":2,"ram":4,"disk":500,"price":15}"#,
        r#"{"vendor":"Vultr","nama_paket":"HF-4","cpu_level":2,"ram_level":4,"disk_level":5,"price_level":3}"#,
    ] {
        let added = send_http(&addr, "POST", "/api/data", body);
        assert!(added.starts_with("HTTP/1.1 201"), "{added}");
    }

    let calc = send_http(
        &addr,
        "POST",
        "/api/calculate",
        r#"{"cpu":0.25,"ram":0.25,"disk":0.25,"price":0.25}"#,
    );
    assert!(calc.starts_with("HTTP/1.1 200"));
    let calc_json: serde_json::Value =
        serde_json::from_str(response_body(&calc)).expect("calculate json");
    assert_eq!(
        calc_json["rankings"].as_array().map(Vec::len),
        Some(2),
        "{calc_json}"
    );
    assert_eq!(calc_json["rankings"][0]["rank"], 1);

    let missing = send_http(&addr, "DELETE", "/api/data/7", "");
    assert!(missing.starts_with("HTTP/1.1 404"));

    let wrong_method = send_http(&addr, "PUT", "/api/calculate", "{}");
    assert!(wrong_method.starts_with("HTTP/1.1 405"));

    let metrics = send_http(&addr, "GET", "/metrics", "");
    assert!(metrics.starts_with("HTTP/1.1 200"));
    assert!(response_header(&metrics).contains("text/plain; version=0.0.4"));
    let body = response_body(&metrics);
    assert!(body.contains(
        "vps_topsis_http_requests_total{route=\"/api/calculate\",status=\"ok\"} 1"
    ));
    assert!(body.contains("vps_topsis_catalog_entries 2"));

    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_file(catalog);
    let _ = std::fs::remove_file(history);
}
