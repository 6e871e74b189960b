//! Augmented FASTQ/FASTA reading and writing with automatic gzip handling
//!
//! An augmented record is an ordinary FASTQ or FASTA record followed by
//! its annotated k-mers, one per line, and optionally its mate sequences:
//!
//! ```text
//! @read1
//! TTAACTCTAGATTAGGGGCGTGACTTAATAAGGTGTGGGCCTAAGCGTCT
//! +
//! IIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIIII
//!             AGATTAGGGGCGTGACTTAATAAG            12 0 0#
//! #mateseq=GCTTAGGCCCACACCTTATTAAGTCACGCCCCTAATCTAGAG#
//! ```
//!
//! The leading spaces of a k-mer line give its offset in the read. The
//! numbers are the abundance in the case sample followed by one or more
//! control samples.

use crate::kmer::reverse_complement;
use crate::record::{AugmentedRecord, KmerAnnotation};
use anyhow::{anyhow, bail, Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const MATE_PREFIX: &str = "#mateseq=";

/// Streaming reader of augmented records
///
/// Single pass: records are produced in file order and the reader cannot
/// be rewound. Once the input is exhausted or an error was returned, every
/// further call to `next` returns `None`.
pub struct AugmentedReader<R: BufRead> {
    reader: R,
    line_no: usize,
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> AugmentedReader<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            pending: None,
            done: false,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        let n = self
            .reader
            .read_line(&mut buf)
            .with_context(|| format!("Failed to read line {}", self.line_no + 1))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    fn expect_line(&mut self, what: &str) -> Result<String> {
        self.read_line()?
            .ok_or_else(|| anyhow!("Unexpected end of input at line {}: expected {}", self.line_no, what))
    }

    fn parse_record(&mut self) -> Result<Option<AugmentedRecord>> {
        let header = loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };

        let is_fastq = match header.as_bytes()[0] {
            b'@' => true,
            b'>' => false,
            _ => bail!(
                "Line {}: expected a record header starting with '@' or '>', got {:?}",
                self.line_no,
                header
            ),
        };
        let id = header[1..]
            .split_whitespace()
            .next()
            .ok_or_else(|| anyhow!("Line {}: record header has no name", self.line_no))?
            .to_string();

        let sequence = self.expect_line("sequence")?;
        let quality = if is_fastq {
            let sep = self.expect_line("'+' separator")?;
            if !sep.starts_with('+') {
                bail!("Line {}: expected '+' separator, got {:?}", self.line_no, sep);
            }
            let qual = self.expect_line("quality string")?;
            if qual.len() != sequence.len() {
                bail!(
                    "Line {}: quality length {} does not match sequence length {} for read {}",
                    self.line_no,
                    qual.len(),
                    sequence.len(),
                    id
                );
            }
            Some(qual)
        } else {
            None
        };

        let mut record = AugmentedRecord {
            id,
            sequence,
            quality,
            annotations: Vec::new(),
            mates: Vec::new(),
        };

        while let Some(line) = self.read_line()? {
            if let Some(rest) = line.strip_prefix(MATE_PREFIX) {
                let mate = rest
                    .strip_suffix('#')
                    .ok_or_else(|| anyhow!("Line {}: unterminated mate sequence", self.line_no))?;
                record.mates.push(mate.to_string());
            } else if line.ends_with('#') && !line.starts_with(['#', '@', '>']) {
                let annot = parse_annotation(&line)
                    .with_context(|| format!("Line {}: malformed k-mer annotation", self.line_no))?;
                record.annotations.push(annot);
            } else {
                self.pending = Some(line);
                break;
            }
        }

        Ok(Some(record))
    }
}

/// Parse `<spaces><kmer><spaces><case> <ctrl>...#`
fn parse_annotation(line: &str) -> Result<KmerAnnotation> {
    let body = line.trim_end_matches('#');
    let mut fields = body.split_whitespace();
    let kmer = fields.next().ok_or_else(|| anyhow!("missing k-mer"))?;
    let abunds = fields
        .map(|f| f.parse::<u64>().with_context(|| format!("invalid abundance {f:?}")))
        .collect::<Result<Vec<_>>>()?;
    if abunds.len() < 2 {
        bail!("expected a case abundance and at least one control abundance");
    }
    Ok(KmerAnnotation::with_controls(kmer, abunds[0], abunds[1..].to_vec()))
}

impl<R: BufRead> Iterator for AugmentedReader<R> {
    type Item = Result<AugmentedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parse_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Open an augmented FASTQ/FASTA file, gzip detected from its magic bytes
///
/// `-` reads from standard input.
pub fn open_augmented<P: AsRef<Path>>(path: P) -> Result<AugmentedReader<Box<dyn BufRead>>> {
    let path = path.as_ref();
    let mut reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open augmented sequence file: {}", path.display()))?;
        Box::new(BufReader::new(file))
    };

    let head = reader
        .fill_buf()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if head.starts_with(&[0x1f, 0x8b]) {
        reader = Box::new(BufReader::new(MultiGzDecoder::new(reader)));
    }
    Ok(AugmentedReader::new(reader))
}

/// Offset of `kmer` (or its reverse complement) in `sequence`, 0 if absent
fn kmer_offset(sequence: &str, kmer: &str) -> usize {
    if let Some(pos) = sequence.find(kmer) {
        return pos;
    }
    reverse_complement(kmer.as_bytes())
        .ok()
        .and_then(|rc| String::from_utf8(rc).ok())
        .and_then(|rc| sequence.find(rc.as_str()))
        .unwrap_or(0)
}

/// Write one record in augmented format
pub fn write_augmented<W: Write + ?Sized>(record: &AugmentedRecord, out: &mut W) -> io::Result<()> {
    match &record.quality {
        Some(qual) => write!(out, "@{}\n{}\n+\n{}\n", record.id, record.sequence, qual)?,
        None => write!(out, ">{}\n{}\n", record.id, record.sequence)?,
    }
    for annot in &record.annotations {
        let offset = kmer_offset(&record.sequence, &annot.sequence);
        let pad = record.sequence.len().saturating_sub(offset + annot.sequence.len()) + 10;
        write!(out, "{:offset$}{}{:pad$}{}", "", annot.sequence, "", annot.case_abund)?;
        for ctrl in &annot.ctrl_abunds {
            write!(out, " {ctrl}")?;
        }
        writeln!(out, "#")?;
    }
    for mate in &record.mates {
        writeln!(out, "{MATE_PREFIX}{mate}#")?;
    }
    Ok(())
}

/// Output file, plain or gzip-compressed
///
/// Call [`OutputFile::finish`] when done: dropping the writer completes a
/// gzip stream too, but any error raised while doing so is lost.
pub enum OutputFile {
    /// Uncompressed file
    Plain(BufWriter<File>),
    /// Gzip-compressed file
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    /// Write any buffered data, the gzip trailer included, and flush the file
    pub fn finish(self) -> io::Result<()> {
        let mut writer = match self {
            OutputFile::Plain(writer) => writer,
            OutputFile::Gzip(encoder) => encoder.finish()?,
        };
        writer.flush()
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Plain(writer) => writer.write(buf),
            OutputFile::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(writer) => writer.flush(),
            OutputFile::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Create an output file, gzip-compressed when the name ends in `.gz`
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<OutputFile> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(OutputFile::Gzip(GzEncoder::new(writer, Compression::default())))
    } else {
        Ok(OutputFile::Plain(writer))
    }
}
