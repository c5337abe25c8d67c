//! Background readers emptying a pipe into memory

/// A thread reading a pipe until end-of-stream
pub(crate) struct Drain {
    name: &'static str,
    handle: std::thread::JoinHandle<Result<Vec<u8>, std::io::Error>>,
}

impl Drain {
    pub(crate) fn spawn<R>(name: &'static str, mut input: R) -> crate::Result<Self>
    where
        R: std::io::Read + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name(format!("capbox-{name}"))
            .spawn(move || {
                let mut ret = Vec::new();
                input.read_to_end(&mut ret).map(|_| ret)
            })
            .map_err(|e| format!("Failed to spawn {name} reader: {e}"))?;
        Ok(Self { name, handle })
    }

    /// Wait for end-of-stream
    ///
    /// Blocks until every write end of the pipe is closed.
    pub(crate) fn finish(self) -> crate::Result<String> {
        let name = self.name;
        let data = self
            .handle
            .join()
            .map_err(|_| format!("{name} reader panicked"))?
            .map_err(|e| format!("Failed to read {name}: {e}"))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_until_writers_close() {
        use std::io::Write as _;

        let (reader, mut writer) = os_pipe::pipe().unwrap();
        let drain = Drain::spawn("stdout", reader).unwrap();
        let writer_clone = writer.try_clone().unwrap();
        writer.write_all(b"Hello ").unwrap();
        drop(writer);
        let mut writer = writer_clone;
        writer.write_all(b"World").unwrap();
        drop(writer);
        assert_eq!(drain.finish().unwrap(), "Hello World");
    }

    #[test]
    fn larger_than_pipe_buffer() {
        use std::io::Write as _;

        let (reader, mut writer) = os_pipe::pipe().unwrap();
        let drain = Drain::spawn("stdout", reader).unwrap();
        let line = "0123456789abcdef".repeat(4);
        for _ in 0..(16 * 1024) {
            writeln!(writer, "{line}").unwrap();
        }
        drop(writer);
        let data = drain.finish().unwrap();
        assert_eq!(data.len(), (line.len() + 1) * 16 * 1024);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        use std::io::Write as _;

        let (reader, mut writer) = os_pipe::pipe().unwrap();
        let drain = Drain::spawn("stderr", reader).unwrap();
        writer.write_all(b"a\xffb").unwrap();
        drop(writer);
        assert_eq!(drain.finish().unwrap(), "a\u{fffd}b");
    }
}
