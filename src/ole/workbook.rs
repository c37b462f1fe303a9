//! Hand-off points between the container engine and its collaborators.
//!
//! The engine produces a [`WorkbookStream`]; a [`RecordDecoder`] turns it
//! into typed records and a [`DocumentWriter`] serializes the result. Only
//! pass-through implementations ship with this crate.

use super::file::CompoundFile;
use crate::common::Result;
use std::fs;
use std::path::Path;
use tracing::info;

/// The workbook stream extracted from a container, with the name it was
/// found under ("Workbook" or "Book").
///
/// `data` is always exactly the declared stream length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookStream {
    /// Name the stream was resolved under
    pub name: &'static str,
    /// Stream contents
    pub data: Vec<u8>,
}

/// Interprets a workbook stream as typed records.
pub trait RecordDecoder {
    /// Decoded document handed to the writer
    type Output;

    /// Decode one workbook stream
    fn decode(&mut self, stream: &WorkbookStream) -> Result<Self::Output>;
}

/// Serializes a decoded document to `output`.
pub trait DocumentWriter<D> {
    /// Write `document` to `output`
    fn write(&mut self, document: &D, output: &Path) -> Result<()>;
}

/// Decoder that hands the raw stream through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl RecordDecoder for PassthroughDecoder {
    type Output = WorkbookStream;

    fn decode(&mut self, stream: &WorkbookStream) -> Result<Self::Output> {
        Ok(stream.clone())
    }
}

/// Writer that stores the raw stream bytes in a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawStreamWriter;

impl DocumentWriter<WorkbookStream> for RawStreamWriter {
    fn write(&mut self, document: &WorkbookStream, output: &Path) -> Result<()> {
        fs::write(output, &document.data)?;
        Ok(())
    }
}

/// Extract the workbook stream from `file`, decode it and write the result.
///
/// The first error from any stage is returned unchanged.
pub fn convert<D, W>(
    file: &CompoundFile,
    decoder: &mut D,
    writer: &mut W,
    output: &Path,
) -> Result<()>
where
    D: RecordDecoder,
    W: DocumentWriter<D::Output>,
{
    let stream = file.workbook_stream()?;
    info!(
        stream = stream.name,
        bytes = stream.data.len(),
        output = %output.display(),
        "converting workbook"
    );
    let document = decoder.decode(&stream)?;
    writer.write(&document, output)
}
