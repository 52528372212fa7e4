use crate::network::connection::ConnectionError;
use async_std::io::BufReader;
use async_std::net::TcpStream;
use futures::AsyncReadExt;

/// Read one `\n`-terminated line, without the terminator and a trailing `\r`.
///
/// `Ok(None)` once the stream is exhausted. A final line without terminator
/// is still returned.
pub async fn read_line(
    reader: &mut BufReader<TcpStream>,
    max_line_bytes: usize,
) -> Result<Option<String>, ConnectionError> {
    let mut line = Vec::new();
    loop {
        match read_one_byte(reader).await {
            None if line.is_empty() => return Ok(None),
            None | Some(b'\n') => break,
            Some(byte) => {
                if line.len() >= max_line_bytes {
                    return Err(ConnectionError::LineTooLong(max_line_bytes));
                }
                line.push(byte);
            }
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| ConnectionError::InvalidUtf8)
}

pub async fn read_one_byte(reader: &mut BufReader<TcpStream>) -> Option<u8> {
    let mut byte = [0u8; 1];
    if reader.read_exact(&mut byte).await.is_err() {
        None
    } else {
        Some(byte[0])
    }
}
