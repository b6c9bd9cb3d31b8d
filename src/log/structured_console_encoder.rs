use std::io;

use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;

const DEFAULT_PATTERN: &str = "{d(%H:%M:%S)} {l:<5} {t} - {m}";

#[derive(Debug, Deserialize)]
pub struct StructuredConsoleEncoderConfig {
    pub pattern: Option<String>,
}

/// Pattern encoder that appends a record's key/value pairs as `key=value`.
/// Values containing whitespace are quoted.
#[derive(Debug)]
pub struct StructuredConsoleEncoder {
    delegate: PatternEncoder,
}

impl StructuredConsoleEncoder {
    pub fn new(pattern: &str) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
        }
    }
}

impl Encode for StructuredConsoleEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = PairWriter { writer: w, io_err: None };
        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " [kv error: {}]", kv_err)?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

struct PairWriter<'a> {
    writer: &'a mut dyn Write,
    io_err: Option<io::Error>,
}

impl PairWriter<'_> {
    fn write_pair(&mut self, key: &Key<'_>, value: &Value<'_>) -> io::Result<()> {
        self.writer.set_style(Style::new().text(Color::Blue).intense(true))?;
        write!(self.writer, " {}", key)?;
        self.writer.set_style(&Style::default())?;

        let rendered = value.to_string();
        if rendered.contains(char::is_whitespace) {
            write!(self.writer, "={:?}", rendered)
        } else {
            write!(self.writer, "={}", rendered)
        }
    }
}

impl<'kvs> VisitSource<'kvs> for PairWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        if let Err(e) = self.write_pair(&key, &value) {
            self.io_err = Some(e);
            return Err(Error::msg("io error while writing key/value pairs"));
        }
        Ok(())
    }
}

pub struct StructuredConsoleEncoderDeserializer;

impl log4rs::config::Deserialize for StructuredConsoleEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = StructuredConsoleEncoderConfig;

    fn deserialize(
        &self,
        config: StructuredConsoleEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
        Ok(Box::new(StructuredConsoleEncoder::new(pattern)))
    }
}
