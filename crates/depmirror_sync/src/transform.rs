use log::trace;
use std::{
    fmt,
    io::{self, Cursor, Read},
    path::Path,
    sync::Arc,
};

pub type Stream = Box<dyn Read + Send>;

/// A content-rewriting stage placed between reading a source file and
/// writing its copy.
///
/// `transform` is called once per file with the source path and the
/// upstream stream, and returns the stream the next stage (or the output
/// file) reads from. Implementations must not keep per-file state between
/// calls. Any closure with the same signature is a `Transformer`.
pub trait Transformer: Send + Sync {
    fn transform(&self, path: &Path, input: Stream) -> io::Result<Stream>;
}

impl<F> Transformer for F
where
    F: Fn(&Path, Stream) -> io::Result<Stream> + Send + Sync,
{
    fn transform(&self, path: &Path, input: Stream) -> io::Result<Stream> {
        self(path, input)
    }
}

/// Adapts a whole-buffer rewrite into a stream stage.
///
/// The upstream is read to the end, handed to the function together with
/// the file path, and the returned bytes become the downstream.
pub struct ContentTransformer<F> {
    rewrite: F,
}

impl<F> ContentTransformer<F>
where
    F: Fn(&Path, Vec<u8>) -> io::Result<Vec<u8>> + Send + Sync,
{
    pub fn new(rewrite: F) -> Self {
        Self { rewrite }
    }
}

impl<F> Transformer for ContentTransformer<F>
where
    F: Fn(&Path, Vec<u8>) -> io::Result<Vec<u8>> + Send + Sync,
{
    fn transform(&self, path: &Path, mut input: Stream) -> io::Result<Stream> {
        let mut buf = Vec::new();
        input.read_to_end(&mut buf)?;
        let out = (self.rewrite)(path, buf)?;
        Ok(Box::new(Cursor::new(out)))
    }
}

/// Ordered list of stages applied to every synced file.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Transformer>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Arc<dyn Transformer>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Chains every stage, in order, onto `source`.
    pub fn apply(&self, path: &Path, source: Stream) -> io::Result<Stream> {
        self.stages.iter().enumerate().try_fold(source, |stream, (i, stage)| {
            trace!("Applying transform stage {} to {}", i, path.display());
            stage.transform(path, stream)
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stages.len()).finish()
    }
}
