//! 集成测试共用工具：测试图片生成与一次性 mock 检测服务。

#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::{Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

pub fn create_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    });

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .expect("failed to encode test image");
    cursor.into_inner()
}

pub fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 255) as u8, (y % 255) as u8, 42])
    });

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    cursor.into_inner()
}

/// 一次响应的定义。
pub struct MockResponse {
    pub status_line: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl MockResponse {
    pub fn detected(image: &[u8]) -> Self {
        Self {
            status_line: "200 OK",
            content_type: "application/json",
            body: format!(
                r#"{{"image_base64": "{}"}}"#,
                general_purpose::STANDARD.encode(image)
            ),
        }
    }

    pub fn failure(status_line: &'static str, body: &str) -> Self {
        Self {
            status_line,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

/// 按顺序应答 `responses`，每个连接一条；返回收到的原始请求。
pub struct MockDetectServer {
    pub endpoint: String,
    handle: thread::JoinHandle<Vec<Vec<u8>>>,
}

impl MockDetectServer {
    pub fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let handle = thread::spawn(move || {
            let mut requests = Vec::with_capacity(responses.len());
            for response in responses {
                let (mut stream, _) = listener.accept().expect("accept failed");
                requests.push(read_full_request(&mut stream));

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    response.status_line,
                    response.content_type,
                    response.body.len()
                );
                stream.write_all(head.as_bytes()).expect("write headers failed");
                stream
                    .write_all(response.body.as_bytes())
                    .expect("write body failed");
                stream.flush().expect("flush failed");
            }
            requests
        });

        Self {
            endpoint: format!("http://127.0.0.1:{}/detect", addr.port()),
            handle,
        }
    }

    /// 等待服务线程结束并取回全部请求。
    pub fn finish(self) -> Vec<Vec<u8>> {
        self.handle.join().expect("server thread failed")
    }
}

/// 读完整个请求（header + 按 Content-Length / chunked 读取正文）。
pub fn read_full_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut buf = [0u8; 16 * 1024];

    let header_end = loop {
        let n = stream.read(&mut buf).expect("read request failed");
        if n == 0 {
            return received;
        }
        received.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&received, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&received[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());

    loop {
        let body = &received[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None => body.ends_with(b"0\r\n\r\n"),
        };
        if done {
            return received;
        }

        let n = stream.read(&mut buf).expect("read request body failed");
        if n == 0 {
            return received;
        }
        received.extend_from_slice(&buf[..n]);
    }
}

/// 从 multipart 请求中取出 `file` 字段的文件字节。
pub fn extract_file_part(request: &[u8]) -> Vec<u8> {
    let marker = b"filename=\"upload.jpg\"";
    let at = find(request, marker).expect("request should carry upload.jpg part");
    let start = at + find(&request[at..], b"\r\n\r\n").expect("part headers should end") + 4;
    let end = rfind(request, b"\r\n--").expect("closing boundary should exist");
    request[start..end].to_vec()
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
