//! Text framing between us and the interpreter child.
//!
//! Commands go to the child as R source: a `handle.input(list(...))` call
//! with every argument injected as a hex-escaped string literal. Responses
//! come back as `write.table` rows framed by two session-random markers, a
//! field separator and an end-of-line tag, so record boundaries survive
//! whatever the parsed sources print into the stream.

use std::io::BufRead;

use super::AgentError;

/// Literal chunk size; longer strings are split into `paste0(...)` parts so
/// no single R line grows unbounded.
const CHUNK_LEN: usize = 50;

/// Session-random framing markers, derived from a nanosecond timestamp.
#[derive(Debug, Clone)]
pub struct Markers {
    pub sep: String,
    pub eol: String,
}

impl Markers {
    pub fn generate() -> Markers {
        Markers {
            sep: format!(
                "RSCAN_sep_magic_{:x}",
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ),
            eol: format!(
                "RSCAN_eol_magic_{:x}",
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ),
        }
    }
}

/// The R program each child runs before accepting commands: an `output`
/// writer using the session markers, and a `handle.input` dispatcher for
/// `ping`, `quit`, `parse_text` and `parse_file`. Interpreter-side errors
/// become `error` records; every command ends with a `done` record.
pub fn prelude(markers: &Markers) -> String {
    [
        "stdin <- file('stdin', 'rb');",
        "out <- stdout();",
        "output <- function(type, data) {",
        &format!(
            " write.table(cbind(type, data), file=out, sep='{}', eol='{}\\n', \
             row.names=FALSE, col.names=FALSE, qmethod='double');",
            markers.sep, markers.eol
        ),
        "};",
        "handle.input.real <- function(input) {",
        " switch(input$opCode,",
        "  ping = {",
        "   output('data', 'pong');",
        "  },",
        "  quit = {",
        "   output('data', 'bye');",
        "   q('no');",
        "  },",
        "  parse_text = {",
        "   parse.data <- getParseData(parse(text=input$args[[2]], keep.source=TRUE));",
        "   parse.data <- parse.data[parse.data$terminal == TRUE, c('token', 'text')];",
        "   parse.data <- cbind(name=input$args[[1]], parse.data);",
        "   output('data', parse.data);",
        "  },",
        "  parse_file = {",
        "   parse.data <- getParseData(parse(file=input$args[[2]], keep.source=TRUE));",
        "   parse.data <- parse.data[parse.data$terminal == TRUE, c('token', 'text')];",
        "   parse.data <- cbind(name=input$args[[1]], parse.data);",
        "   output('data', parse.data);",
        "  }",
        " );",
        "};",
        "handle.input <- function(input) {",
        " if (!is.null(input)) {",
        "  tryCatch(handle.input.real(input), error = function(err) output('error', \
         as.character(err)), finally = {",
        "   output('done', NULL);",
        "   flush(out);",
        "  });",
        " };",
        "};\n",
    ]
    .join("")
}

/// Encode one command invocation as R source, newline-terminated.
pub fn encode_command(op: &str, args: &[&str]) -> String {
    let mut cmd = format!("handle.input(list(opCode=\"{op}\", args=list(");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            cmd.push_str(",\n");
        }
        cmd.push_str(&encode_string_literal(arg));
    }
    cmd.push_str(")));\n\n");
    cmd
}

/// Encode `s` as an R string literal the interpreter can evaluate no matter
/// what bytes the original held. Strings over [`CHUNK_LEN`] chars become
/// `paste0(...)` of chunked literals.
pub fn encode_string_literal(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > CHUNK_LEN {
        let mut out = String::from("paste0(");
        for (n, chunk) in chars.chunks(CHUNK_LEN).enumerate() {
            if n > 0 {
                out.push_str(",\n");
            }
            out.push_str(&encode_chunk(chunk));
        }
        out.push(')');
        return out;
    }
    encode_chunk(&chars)
}

fn encode_chunk(chars: &[char]) -> String {
    let mut out = String::from("'");
    for &c in chars {
        // R's parse() chokes on NUL; a newline parses the same for our
        // purposes.
        let c = if c == '\0' { '\n' } else { c };
        if c.is_ascii_alphanumeric() || "_-.{}[](),:; ".contains(c) {
            out.push(c);
        } else if (c as u32) <= 0xffff {
            out.push_str(&format!("\\u{:04x}", c as u32));
        } else {
            out.push_str(&format!("\\U{:08x}", c as u32));
        }
    }
    out.push('\'');
    out
}

/// One decoded response record.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Data(Vec<String>),
    Error(String),
    Done,
}

/// Incremental decoder over the child's stdout.
///
/// A record may span several physical lines (quoted fields can embed
/// newlines); lines are accumulated until the end-of-line marker shows up.
/// Lines that do not open with a quote are interpreter noise and only
/// logged.
pub struct RecordReader<R> {
    input: R,
    markers: Markers,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R, markers: Markers) -> RecordReader<R> {
        RecordReader { input, markers }
    }

    fn next_line(&mut self) -> Result<String, AgentError> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(AgentError::Protocol {
                reason: "unexpected end of interpreter output".to_string(),
            });
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    pub fn read_record(&mut self) -> Result<Record, AgentError> {
        loop {
            let mut line = self.next_line()?;
            if line.is_empty() {
                continue;
            }
            if !line.starts_with('"') {
                log::warn!("spurious line from interpreter: {line}");
                continue;
            }
            while !line.ends_with(&self.markers.eol) {
                line.push_str(&self.next_line()?);
            }
            line.truncate(line.len() - self.markers.eol.len());

            let fields: Vec<String> =
                line.split(&self.markers.sep).map(decode_field).collect();
            match fields[0].as_str() {
                "done" => return Ok(Record::Done),
                "error" => {
                    return Ok(Record::Error(
                        fields.get(1).cloned().unwrap_or_default(),
                    ))
                }
                "data" => return Ok(Record::Data(fields[1..].to_vec())),
                _ => log::warn!("spurious record from interpreter: {line}"),
            }
        }
    }
}

fn decode_field(raw: &str) -> String {
    raw.trim_matches('"').replace("\"\"", "\"")
}
