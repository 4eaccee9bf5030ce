use std::io::{self, BufRead, BufReader, Read};

/// Anything the section/key parser can pull lines from.
pub trait LineSource {
	/// Append the next line (with its newline, if any) to `buf`.
	///
	/// Returns the number of bytes read; zero means end of input.
	fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;

	/// Number of leading lines made up by the source rather than read from
	/// the input. Line numbers in errors skip these.
	fn synthetic_lines(&self) -> usize {
		0
	}
}

impl<R: Read> LineSource for BufReader<R> {
	fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
		BufRead::read_line(self, buf)
	}
}

impl LineSource for &[u8] {
	fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
		BufRead::read_line(self, buf)
	}
}

/// Injects a synthetic `[name]` header ahead of the underlying lines.
///
/// Keys written before any real section header land in the synthetic
/// section. The underlying lines are passed through unchanged.
pub struct Sectionless<S> {
	header: Option<String>,
	inner: S,
}

impl<S: LineSource> Sectionless<S> {
	pub fn new(inner: S, section: &str) -> Self {
		Self {
			header: Some(format!("[{section}]\n")),
			inner,
		}
	}

	#[cfg(test)]
	fn into_inner(self) -> S {
		self.inner
	}
}

impl<S: LineSource> LineSource for Sectionless<S> {
	fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
		match self.header.take() {
			Some(header) => {
				buf.push_str(&header);
				Ok(header.len())
			}
			None => self.inner.read_line(buf),
		}
	}

	fn synthetic_lines(&self) -> usize {
		1
	}
}
