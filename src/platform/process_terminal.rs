//! Process-backed terminal: raw mode via termios, polled stdin, `TIOCGWINSZ` sizing.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use libc::{self, c_int};
use signal_hook::iterator::Signals;
use tracing::{debug, warn};

use crate::core::terminal::Terminal;
use crate::platform::input::InputFramer;

const DEFAULT_COLUMNS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;
const READ_CHUNK: usize = 4096;
const RESTORE_OUTPUT: &str = "\x1b[?2004l\x1b[?25h";

fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result > 0 && (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
    }
}

fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(count) => written += count.min(bytes.len() - written),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

fn poll_readable(fd: c_int, timeout: Duration) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as c_int;
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if result < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0)
}

fn read_fd(fd: c_int, buffer: &mut [u8]) -> io::Result<usize> {
    let result = unsafe { libc::read(fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len()) };
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

fn is_tty(fd: c_int) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Restores the termios saved when raw mode was entered. Shared with signal handlers.
#[derive(Clone)]
pub struct TerminalRestore {
    fd: c_int,
    saved: Arc<Mutex<Option<libc::termios>>>,
    stdout_fd: c_int,
}

impl TerminalRestore {
    /// Put the saved mode back, turn off bracketed paste and show the cursor. Safe to call
    /// any number of times.
    pub fn restore(&self) -> io::Result<()> {
        let saved = match self.saved.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(original) = saved {
            set_termios(self.fd, &original)?;
            if is_tty(self.stdout_fd) {
                write_fd(self.stdout_fd, RESTORE_OUTPUT)?;
            }
        }
        Ok(())
    }
}

pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    saved: Arc<Mutex<Option<libc::termios>>>,
    framer: InputFramer,
    buffer: Vec<u8>,
    /// Set once stdin reports end of file; it is not polled again after that.
    eof: bool,
}

impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_fds(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    fn with_fds(stdin_fd: c_int, stdout_fd: c_int) -> Self {
        Self {
            stdin_fd,
            stdout_fd,
            saved: Arc::new(Mutex::new(None)),
            framer: InputFramer::default(),
            buffer: vec![0; READ_CHUNK],
            eof: false,
        }
    }

    pub fn restore_handle(&self) -> TerminalRestore {
        TerminalRestore {
            fd: self.stdin_fd,
            saved: Arc::clone(&self.saved),
            stdout_fd: self.stdout_fd,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = get_termios(self.stdin_fd)?;
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        // Keep output post-processing off; the renderer writes explicit `\r\n`.
        set_termios(self.stdin_fd, &raw)?;
        let mut saved = self.saved.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if saved.is_none() {
            *saved = Some(original);
        }
        Ok(())
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        loop {
            let count = match read_fd(self.stdin_fd, &mut self.buffer) {
                Ok(count) => count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => return Err(err),
            };
            if count == 0 {
                debug!("stdin reached end of file");
                self.eof = true;
                break;
            }
            data.extend_from_slice(&self.buffer[..count]);
            if count < self.buffer.len() || !poll_readable(self.stdin_fd, Duration::ZERO)? {
                break;
            }
        }
        Ok(data)
    }
}

impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ProcessTerminal {
    fn start(&mut self) -> io::Result<()> {
        if !is_tty(self.stdin_fd) {
            debug!("stdin is not a tty, leaving terminal mode alone");
            return Ok(());
        }
        self.enable_raw_mode()
    }

    fn stop(&mut self) -> io::Result<()> {
        // Drop unread input so it does not leak into the shell.
        if is_tty(self.stdin_fd) {
            let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };
        }
        let saved = self
            .saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(original) = saved {
            set_termios(self.stdin_fd, &original)?;
        }
        Ok(())
    }

    fn poll_input(&mut self, timeout: Duration) -> io::Result<Vec<String>> {
        let now = Instant::now();
        let timeout = self.framer.next_timeout(now, timeout);
        if self.eof {
            // A closed stdin polls readable forever; wait out the interval instead.
            thread::sleep(timeout);
            return Ok(self.framer.flush_due(Instant::now()));
        }
        if !poll_readable(self.stdin_fd, timeout)? {
            return Ok(self.framer.flush_due(Instant::now()));
        }
        let data = self.read_available()?;
        Ok(self.framer.push(&data))
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        write_fd(self.stdout_fd, data)
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(DEFAULT_COLUMNS)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(DEFAULT_ROWS)
    }

    fn is_tty(&self) -> bool {
        is_tty(self.stdout_fd)
    }
}

/// Signal handler guard for cleanup hooks. Dropping it stops listening.
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_cleanup_once<F>(cleanup: &Arc<F>, ran: &AtomicBool, signal: c_int)
where
    F: Fn(c_int) + Send + Sync + 'static + ?Sized,
{
    if !ran.swap(true, Ordering::SeqCst) {
        cleanup(signal);
    }
}

/// Runs `cleanup` once on SIGINT, SIGTERM or SIGHUP, then exits with `128 + signal`.
pub fn install_signal_handlers<F>(cleanup: F) -> io::Result<SignalHookGuard>
where
    F: Fn(c_int) + Send + Sync + 'static,
{
    let cleanup = Arc::new(cleanup);
    let ran = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([libc::SIGINT, libc::SIGTERM, libc::SIGHUP])?;
    let handle = signals.handle();

    let thread = thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            warn!(signal, "terminating on signal");
            run_cleanup_once(&cleanup, &ran, signal);
            std::process::exit(128 + signal);
        }
    });

    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn write_all_retries_short_and_interrupted_writes() {
        let written = RefCell::new(Vec::new());
        let mut calls = 0;
        let result = write_all_fd_with(
            1,
            b"hello",
            |_, buf| {
                calls += 1;
                match calls {
                    1 => Err(io::Error::from(io::ErrorKind::Interrupted)),
                    2 => {
                        written.borrow_mut().extend_from_slice(&buf[..2]);
                        Ok(2)
                    }
                    _ => {
                        written.borrow_mut().extend_from_slice(buf);
                        Ok(buf.len())
                    }
                }
            },
            |_| Ok(()),
        );
        assert!(result.is_ok());
        assert_eq!(written.into_inner(), b"hello");
    }

    #[test]
    fn write_zero_is_an_error() {
        let result = write_all_fd_with(1, b"x", |_, _| Ok(0), |_| Ok(()));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn would_block_waits_then_retries() {
        let mut waited = 0;
        let mut attempts = 0;
        let result = write_all_fd_with(
            1,
            b"ab",
            |_, buf| {
                attempts += 1;
                if attempts == 1 {
                    Err(io::Error::from(io::ErrorKind::WouldBlock))
                } else {
                    Ok(buf.len())
                }
            },
            |_| {
                waited += 1;
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert_eq!(waited, 1);
    }

    #[test]
    fn closed_stdin_waits_instead_of_spinning() {
        let mut fds = [0 as c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let (read_end, write_end) = (fds[0], fds[1]);
        unsafe {
            libc::write(write_end, b"hi".as_ptr() as *const libc::c_void, 2);
            libc::close(write_end);
        }
        let mut terminal = ProcessTerminal::with_fds(read_end, write_end);
        let interval = Duration::from_millis(30);

        assert_eq!(terminal.poll_input(interval).unwrap(), vec!["hi"]);
        assert!(terminal.poll_input(interval).unwrap().is_empty());
        assert!(terminal.eof);

        let started = Instant::now();
        assert!(terminal.poll_input(interval).unwrap().is_empty());
        assert!(started.elapsed() >= Duration::from_millis(25));
        unsafe {
            libc::close(read_end);
        }
    }

    #[test]
    fn cleanup_runs_once() {
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let cleanup = Arc::new(move |_signal: c_int| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let ran = AtomicBool::new(false);
        run_cleanup_once(&cleanup, &ran, libc::SIGTERM);
        run_cleanup_once(&cleanup, &ran, libc::SIGTERM);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
