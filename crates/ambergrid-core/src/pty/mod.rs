//! Raw, synchronous PTY host: opens a pseudo-terminal, forks the user's
//! shell under it, and exposes non-blocking read/write plus liveness and
//! resize operations. No async runtime and no background thread are
//! involved; every call here does its work and returns immediately.

use ambergrid_common::{Size, TermError};
use std::ffi::CString;
use tracing::{debug, error, info, instrument};

const READ_CHUNK: usize = 4096;

/// Owns the PTY master file descriptor and the child's pid.
pub struct PtyHost {
    master_fd: libc::c_int,
    child_pid: libc::pid_t,
    pending_input: Vec<u8>,
}

impl PtyHost {
    /// Opens a PTY, forks, and execs the user's login shell (`SHELL`, or
    /// `/bin/bash` if unset) in the child. Returns once the parent side is
    /// set up; any failure here is fatal per the engine's error taxonomy.
    #[instrument]
    pub fn spawn(size: Size) -> Result<Self, TermError> {
        let mut master: libc::c_int = -1;
        let mut slave: libc::c_int = -1;

        // SAFETY: openpty is given valid out-pointers and no name/termios
        // overrides; `winsize`/`termios` null means kernel defaults.
        let rc = unsafe {
            libc::openpty(
                &mut master,
                &mut slave,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
            )
        };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            error!(%err, "openpty failed");
            return Err(TermError::PtyAlloc(err.to_string()));
        }
        info!(master, slave, "pty allocated");

        // SAFETY: fork() duplicates the process; the child branch below
        // only calls async-signal-safe functions before exec.
        let pid = unsafe { libc::fork() };
        if pid == -1 {
            let err = std::io::Error::last_os_error();
            unsafe {
                libc::close(master);
                libc::close(slave);
            }
            error!(%err, "fork failed");
            return Err(TermError::Fork(err.to_string()));
        }

        if pid == 0 {
            // SAFETY: child process, about to exec or _exit; never returns.
            unsafe { Self::run_child(master, slave) };
            unreachable!("run_child always exits the process");
        }

        // SAFETY: the slave fd belongs to the child now.
        unsafe { libc::close(slave) };

        // SAFETY: master is a valid, just-opened fd; F_SETFL with the
        // flags read back from F_GETFL only adds O_NONBLOCK.
        unsafe {
            let flags = libc::fcntl(master, libc::F_GETFL, 0);
            if flags != -1 {
                libc::fcntl(master, libc::F_SETFL, flags | libc::O_NONBLOCK);
            }
        }

        let mut host = Self {
            master_fd: master,
            child_pid: pid,
            pending_input: Vec::new(),
        };
        host.apply_winsize(size);
        info!(pid, "shell spawned");
        Ok(host)
    }

    /// Runs entirely in the forked child: establishes a session, makes the
    /// slave the controlling terminal, wires it to stdio, puts it in
    /// cooked mode, and execs the shell. Never returns.
    ///
    /// # Safety
    /// Must only run in the child immediately after `fork()`, before any
    /// other thread or heap-owning code runs.
    unsafe fn run_child(master: libc::c_int, slave: libc::c_int) -> ! {
        libc::close(master);

        if libc::setsid() == -1 {
            libc::_exit(1);
        }
        if libc::ioctl(slave, libc::TIOCSCTTY as _, 0) == -1 {
            libc::_exit(1);
        }

        libc::dup2(slave, libc::STDIN_FILENO);
        libc::dup2(slave, libc::STDOUT_FILENO);
        libc::dup2(slave, libc::STDERR_FILENO);
        if slave > libc::STDERR_FILENO {
            libc::close(slave);
        }

        let mut term: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(libc::STDIN_FILENO, &mut term) == 0 {
            libc::cfmakeraw(&mut term);
            term.c_lflag |= libc::ECHO | libc::ICANON;
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &term);
        }

        let term_var = CString::new("TERM").unwrap();
        let term_val = CString::new("xterm-256color").unwrap();
        libc::setenv(term_var.as_ptr(), term_val.as_ptr(), 1);

        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
        let shell_c = CString::new(shell).unwrap_or_else(|_| CString::new("/bin/bash").unwrap());
        let login_flag = CString::new("-l").unwrap();
        libc::execl(
            shell_c.as_ptr(),
            shell_c.as_ptr(),
            login_flag.as_ptr(),
            std::ptr::null::<libc::c_char>(),
        );
        libc::_exit(127);
    }

    /// Pushes the current size to the kernel so child programs see it via
    /// `TIOCGWINSZ`/`SIGWINCH`.
    #[instrument(skip(self))]
    pub fn apply_winsize(&mut self, size: Size) {
        let ws = libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: master_fd is open and owned by this host.
        unsafe {
            libc::ioctl(self.master_fd, libc::TIOCSWINSZ as _, &ws);
        }
        debug!(rows = size.rows, cols = size.cols, "winsize applied");
    }

    /// Drains everything currently available on the master into `out`,
    /// stopping at EAGAIN/EWOULDBLOCK. Retries on EINTR. An EOF read shuts
    /// the PTY down. Returns the number of bytes appended to `out`.
    #[instrument(skip(self, out))]
    pub fn read_available(&mut self, out: &mut Vec<u8>) -> usize {
        if self.master_fd == -1 {
            return 0;
        }
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0;
        loop {
            // SAFETY: buf is a valid, appropriately-sized stack buffer.
            let n = unsafe {
                libc::read(self.master_fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len())
            };
            if n > 0 {
                let n = n as usize;
                out.extend_from_slice(&buf[..n]);
                total += n;
            } else if n == 0 {
                info!("pty reached EOF, shutting down");
                self.shutdown();
                break;
            } else {
                let err = std::io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(e) if e == libc::EAGAIN || e == libc::EWOULDBLOCK => break,
                    Some(e) if e == libc::EINTR => continue,
                    _ => {
                        error!(%err, "pty read failed");
                        break;
                    }
                }
            }
        }
        total
    }

    /// Attempts a full write; on partial progress that then blocks, the
    /// remainder is appended to the pending-input buffer and drained on a
    /// later tick by [`Self::flush_pending`].
    pub fn write(&mut self, data: &[u8]) {
        if self.master_fd == -1 || data.is_empty() {
            return;
        }
        self.write_or_buffer(data);
    }

    /// Drains any bytes left over from a previous [`Self::write`] that
    /// would have blocked.
    #[instrument(skip(self))]
    pub fn flush_pending(&mut self) {
        if self.pending_input.is_empty() || self.master_fd == -1 {
            return;
        }
        let pending = std::mem::take(&mut self.pending_input);
        self.write_or_buffer(&pending);
    }

    fn write_or_buffer(&mut self, data: &[u8]) {
        let mut offset = 0;
        while offset < data.len() {
            // SAFETY: writes `data.len() - offset` bytes from a valid slice.
            let n = unsafe {
                libc::write(
                    self.master_fd,
                    data[offset..].as_ptr() as *const libc::c_void,
                    data.len() - offset,
                )
            };
            if n > 0 {
                offset += n as usize;
            } else {
                let err = std::io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(e) if e == libc::EAGAIN || e == libc::EWOULDBLOCK => {
                        self.pending_input.extend_from_slice(&data[offset..]);
                        return;
                    }
                    Some(e) if e == libc::EINTR => continue,
                    _ => {
                        error!(%err, "pty write failed, dropping remaining bytes");
                        return;
                    }
                }
            }
        }
    }

    /// Reaps the child without blocking. Returns whether it is still
    /// running; clears the stored pid once it has exited.
    pub fn is_alive(&mut self) -> bool {
        if self.child_pid <= 0 {
            return false;
        }
        let mut status: libc::c_int = 0;
        // SAFETY: child_pid was returned by a fork() this process owns.
        let result = unsafe { libc::waitpid(self.child_pid, &mut status, libc::WNOHANG) };
        if result == self.child_pid {
            debug!(pid = self.child_pid, "child process exited");
            self.child_pid = -1;
            false
        } else {
            true
        }
    }

    /// Closes the master and, if the child is still alive, sends SIGHUP
    /// and blocks until it exits.
    #[instrument(skip(self))]
    pub fn shutdown(&mut self) {
        if self.master_fd != -1 {
            // SAFETY: master_fd is owned by this host and open.
            unsafe { libc::close(self.master_fd) };
            self.master_fd = -1;
        }
        if self.child_pid > 0 {
            let mut status: libc::c_int = 0;
            // SAFETY: child_pid was returned by a fork() this process owns.
            unsafe {
                if libc::waitpid(self.child_pid, &mut status, libc::WNOHANG) == 0 {
                    libc::kill(self.child_pid, libc::SIGHUP);
                    libc::waitpid(self.child_pid, &mut status, 0);
                }
            }
            self.child_pid = -1;
        }
    }
}

impl Drop for PtyHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
