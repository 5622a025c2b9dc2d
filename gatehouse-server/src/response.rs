use bytes::{BufMut, Bytes, BytesMut};
use http::StatusCode;

fn reason(status: StatusCode) -> &'static str {
    match status {
        StatusCode::URI_TOO_LONG => "Request URI Too Long",
        _ => status.canonical_reason().unwrap_or("Unknown"),
    }
}

fn write_head(buf: &mut BytesMut, status: StatusCode, headers: &[(&str, &str)]) {
    let reason = reason(status);
    buf.put_slice(format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason).as_bytes());
    for (name, value) in headers {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf.put_slice(b"\r\n");
}

pub fn greeting_response(greeting: &str, close: bool) -> Bytes {
    let length = greeting.len().to_string();
    let connection = if close { "close" } else { "keep-alive" };
    let mut buf = BytesMut::with_capacity(128 + greeting.len());
    write_head(
        &mut buf,
        StatusCode::OK,
        &[
            ("Content-Type", "text/plain"),
            ("Content-Length", &length),
            ("Connection", connection),
        ],
    );
    buf.put_slice(greeting.as_bytes());
    buf.freeze()
}

pub fn failure_response(status: StatusCode) -> Bytes {
    let reason = reason(status);
    let code = status.as_u16();
    let body = format!(
        "<html><head><title>{code}</title></head><body><h1>{code} {reason}</h1></body></html>"
    );
    let length = body.len().to_string();
    let mut buf = BytesMut::with_capacity(128 + body.len());
    write_head(
        &mut buf,
        status,
        &[
            ("Content-Type", "text/html"),
            ("Content-Length", &length),
            ("Connection", "close"),
        ],
    );
    buf.put_slice(body.as_bytes());
    buf.freeze()
}
