use crate::Result;

/// Exclusive output owned by one writer thread.
pub trait RecordSink<R>: Send {
    fn write(&mut self, record: &R) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

/// In-memory sink, mostly for tests and small runs.
impl<R: Clone + Send> RecordSink<R> for Vec<R> {
    #[inline]
    fn write(&mut self, record: &R) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
