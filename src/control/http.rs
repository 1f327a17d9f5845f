//! TCP control endpoint.
//!
//! A deliberately tiny request/response server: one request per
//! connection, only the request line is read. `GET /` serves an HTML page
//! embedding the plain-text report with a reset button, `/report` and
//! `/text` serve the raw report, `POST /reset` resets the profiler and
//! redirects back to `/`. Anything else is a 404.
//!
//! A bad connection or an unparseable request is logged and dropped; the
//! accept loop keeps serving. The endpoint must never take the host
//! application down with it.

use crate::error::{Error, Result};
use crate::profiler::Profiler;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

const STATUS_OK: &str = "200 OK";
const STATUS_REDIRECT: &str = "302 Found";
const STATUS_NOT_FOUND: &str = "404 Not Found";

const CT_TEXT_HTML: &str = "text/html";
const CT_TEXT_PLAIN: &str = "text/plain";

const PAGE_TEMPLATE: &str = "<html><body style='background-color: #AAA;'>\
<textarea style='width: 100%; height: 600px; margin-bottom: 5px;'>{report}</textarea>\
<form action='/reset' method='POST'>\
<input type='submit' value='Reset profiler' style='border: solid 3px #FF9; background-color: #FF9; color: #000;'/>\
</form>\
</body></html>";

/// Handle to a running control endpoint.
///
/// The accept loop runs on its own named thread until [`shutdown`] is
/// called or the handle is dropped.
///
/// [`shutdown`]: HttpControl::shutdown
pub struct HttpControl {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HttpControl {
    /// Bind `addr` and start serving `profiler`'s control surface.
    ///
    /// Bind to port 0 to let the OS pick a free port; [`local_addr`]
    /// reports the effective address.
    ///
    /// [`local_addr`]: HttpControl::local_addr
    pub fn bind(addr: impl ToSocketAddrs, profiler: Profiler) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local = listener.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("proftree-http".to_string())
            .spawn(move || accept_loop(listener, profiler, loop_stop))?;

        debug!(%local, "control endpoint listening");
        Ok(HttpControl {
            addr: local,
            stop,
            handle: Some(handle),
        })
    }

    /// Address the endpoint is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the accept loop and wait for it to finish.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Release);
        // The accept call blocks; a throwaway connection unblocks it so
        // the loop observes the stop flag.
        let _ = TcpStream::connect(self.addr);

        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::ControlThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for HttpControl {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn accept_loop(listener: TcpListener, profiler: Profiler, stop: Arc<AtomicBool>) {
    for connection in listener.incoming() {
        if stop.load(Ordering::Acquire) {
            break;
        }
        match connection {
            Ok(stream) => {
                if let Err(err) = handle_connection(stream, &profiler) {
                    warn!("control connection failed: {err}");
                }
            }
            Err(err) => warn!("control accept failed: {err}"),
        }
    }
    debug!("control endpoint stopped");
}

fn handle_connection(stream: TcpStream, profiler: &Profiler) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut stream = stream;
    let mut parts = request_line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => (method.to_ascii_uppercase(), path.to_ascii_lowercase()),
        _ => {
            respond(&mut stream, STATUS_NOT_FOUND, None, None, None)?;
            return Err(Error::MalformedRequest(request_line.trim().to_string()));
        }
    };

    if method != "GET" && method != "POST" {
        return respond(&mut stream, STATUS_NOT_FOUND, None, None, None);
    }

    match path.as_str() {
        "/" => {
            let page = PAGE_TEMPLATE.replace("{report}", &profiler.render_to_string());
            respond(&mut stream, STATUS_OK, Some(CT_TEXT_HTML), Some(&page), None)
        }
        "/report" | "/text" => {
            let report = profiler.render_to_string();
            respond(&mut stream, STATUS_OK, Some(CT_TEXT_PLAIN), Some(&report), None)
        }
        "/reset" => {
            profiler.reset();
            respond(&mut stream, STATUS_REDIRECT, None, None, Some("/"))
        }
        _ => respond(&mut stream, STATUS_NOT_FOUND, None, None, None),
    }
}

fn respond(
    stream: &mut TcpStream,
    status: &str,
    content_type: Option<&str>,
    body: Option<&str>,
    location: Option<&str>,
) -> Result<()> {
    write!(stream, "HTTP/1.1 {status}\r\n")?;
    write!(stream, "Server: Profiler HTTP Control\r\n")?;
    if let Some(content_type) = content_type {
        write!(stream, "Content-type: {content_type}\r\n")?;
    }
    if let Some(location) = location {
        write!(stream, "Location: {location}\r\n")?;
    }
    match body {
        Some(body) => write!(stream, "Content-length: {}\r\n\r\n{body}", body.len())?,
        None => write!(stream, "\r\n")?,
    }
    stream.flush()?;
    Ok(())
}
