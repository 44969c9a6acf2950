use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::{CollectingReporter, Config, RunStatus, Session};

/// A `Write` sink whose contents stay readable after it is boxed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything one run produced.
#[allow(dead_code)]
pub struct Outcome {
    pub status: RunStatus,
    pub output: String,
    pub diagnostics: Vec<String>,
    pub reporter: CollectingReporter,
}

#[allow(dead_code)]
impl Outcome {
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

/// A session wired to in-memory output and diagnostics.
#[allow(dead_code)]
pub fn session(config: Config) -> (Session, SharedBuffer, CollectingReporter) {
    let out = SharedBuffer::default();
    let reporter = CollectingReporter::new();
    let session = Session::with_io(config, Box::new(out.clone()), Box::new(reporter.clone()));

    (session, out, reporter)
}

#[allow(dead_code)]
pub fn run_with(config: Config, source: &str) -> Outcome {
    let (mut session, out, reporter) = session(config);
    let status = session.run(source);

    Outcome {
        status,
        output: out.contents(),
        diagnostics: reporter.messages(),
        reporter,
    }
}

#[allow(dead_code)]
pub fn run(source: &str) -> Outcome {
    run_with(Config::default(), source)
}
