use crate::utils::error::Result;
use std::io::Write;
use std::sync::{Arc, Mutex};

const RULE_WIDTH: usize = 60;

/// Console writer for the lessons. Keeps the heading and indentation style in one place.
pub struct Narrator {
    out: Box<dyn Write + Send>,
}

impl Narrator {
    pub fn new<W: Write + Send + 'static>(out: W) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Narrator plus a handle to everything it writes.
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    pub fn banner(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    /// Banner preceded by an empty line, for every banner after the first.
    pub fn next_banner(&mut self, title: &str) -> Result<()> {
        writeln!(self.out)?;
        self.banner(title)
    }

    pub fn section(&mut self, number: usize, title: &str) -> Result<()> {
        writeln!(self.out, "\n{}. {}:", number, title)?;
        Ok(())
    }

    pub fn heading(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "\n{}:", title)?;
        Ok(())
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "   {}", text.as_ref())?;
        Ok(())
    }

    pub fn lines(&mut self, texts: &[&str]) -> Result<()> {
        for text in texts {
            self.line(text)?;
        }
        Ok(())
    }

    pub fn bullets(&mut self, items: &[&str]) -> Result<()> {
        for item in items {
            writeln!(self.out, "   - {}", item)?;
        }
        Ok(())
    }

    pub fn checks(&mut self, items: &[&str]) -> Result<()> {
        for item in items {
            writeln!(self.out, "   ✓ {}", item)?;
        }
        Ok(())
    }

    pub fn numbered(&mut self, items: &[&str]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            writeln!(self.out, "{}. {}", i + 1, item)?;
        }
        Ok(())
    }

    /// Unindented line, used for tables and summaries.
    pub fn raw(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn rule(&mut self, width: usize) -> Result<()> {
        writeln!(self.out, "{}", "-".repeat(width))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// `1000000` -> `1,000,000`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        match self.inner.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("capture buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
