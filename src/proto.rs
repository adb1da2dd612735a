//! Wire types for the PutLogs body and their protobuf encoding.

use compact_str::CompactString;
use std::{io, io::Write};

/// One log entry on the wire: a timestamp plus key/value content pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    time: u32,
    contents: Vec<(CompactString, CompactString)>,
}

/// A group of logs written in one call, with optional batch-level topic and
/// source labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroup {
    topic: Option<CompactString>,
    source: Option<CompactString>,
    logs: Vec<Log>,
}

impl Log {
    /// Create an empty log with the given timestamp in epoch seconds.
    pub fn new(time: u32) -> Self {
        Log {
            time,
            contents: Vec::new(),
        }
    }

    /// Append a content pair.
    pub fn push(&mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) {
        self.contents.push((key.into(), value.into()));
    }

    /// Append a content pair, builder style.
    pub fn with(mut self, key: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        self.push(key, value);
        self
    }

    /// The log timestamp in epoch seconds.
    pub fn time(&self) -> u32 {
        self.time
    }

    /// The content pairs in insertion order.
    pub fn contents(&self) -> &[(CompactString, CompactString)] {
        &self.contents
    }
}

impl LogGroup {
    /// Create a group from a batch of logs.
    pub fn new(logs: Vec<Log>) -> Self {
        LogGroup {
            topic: None,
            source: None,
            logs,
        }
    }

    /// Set the batch topic label.
    pub fn with_topic(mut self, topic: impl Into<CompactString>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the batch source label.
    pub fn with_source(mut self, source: impl Into<CompactString>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The batch topic label, if set.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The batch source label, if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The logs in the group.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Exact length of the encoded group in bytes.
    pub fn encoded_len(&self) -> usize {
        encoded_len_repeated(1u32, self.logs.iter(), self.logs.len())
            + self
                .topic
                .as_ref()
                .map_or(0, |value| encoded_str_len(3u32, value))
            + self
                .source
                .as_ref()
                .map_or(0, |value| encoded_str_len(4u32, value))
    }

    /// Encode the group into `writer` using the SLS LogGroup schema.
    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for log in &self.logs {
            encode_message(1u32, log, writer)?;
        }
        if let Some(ref value) = self.topic {
            encode_str(3u32, value, writer)?;
        }
        if let Some(ref value) = self.source {
            encode_str(4u32, value, writer)?;
        }
        Ok(())
    }
}

trait Message {
    fn encode_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;
    fn encoded_len(&self) -> usize;
}

impl<T: Message> Message for &T {
    #[inline]
    fn encode_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        T::encode_to(self, writer)
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        T::encoded_len(self)
    }
}

impl<S: AsRef<str>> Message for (S, S) {
    #[inline]
    fn encode_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        encode_str(1u32, self.0.as_ref(), writer)?;
        encode_str(2u32, self.1.as_ref(), writer)
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        encoded_str_len(1u32, self.0.as_ref()) + encoded_str_len(2u32, self.1.as_ref())
    }
}

impl Message for Log {
    #[inline]
    fn encode_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        encode_varint_field(1u32, u64::from(self.time), writer)?;
        for pair in &self.contents {
            encode_message(2u32, pair, writer)?;
        }
        Ok(())
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        encoded_varint_field_len(1u32, u64::from(self.time))
            + encoded_len_repeated(2u32, self.contents.iter(), self.contents.len())
    }
}

// Wire-level helpers, following the prost encoding rules.

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum WireType {
    Varint = 0,
    SixtyFourBit = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    ThirtyTwoBit = 5,
}

#[inline]
fn encode_varint<W: Write>(mut value: u64, writer: &mut W) -> io::Result<()> {
    loop {
        if value < 0x80 {
            writer.write_all(&[value as u8])?;
            break;
        } else {
            writer.write_all(&[((value & 0x7F) | 0x80) as u8])?;
            value >>= 7;
        }
    }
    Ok(())
}

#[inline]
fn encode_key<W: Write>(tag: u32, wire_type: WireType, writer: &mut W) -> io::Result<()> {
    let key = (tag << 3) | wire_type as u32;
    encode_varint(u64::from(key), writer)
}

#[inline]
fn encode_varint_field<W: Write>(tag: u32, value: u64, writer: &mut W) -> io::Result<()> {
    encode_key(tag, WireType::Varint, writer)?;
    encode_varint(value, writer)
}

#[inline]
fn encode_message<W: Write>(tag: u32, msg: &impl Message, writer: &mut W) -> io::Result<()> {
    encode_key(tag, WireType::LengthDelimited, writer)?;
    encode_varint(msg.encoded_len() as u64, writer)?;
    msg.encode_to(writer)
}

#[inline]
fn encode_str<W: Write>(tag: u32, value: impl AsRef<str>, writer: &mut W) -> io::Result<()> {
    let value = value.as_ref();
    encode_key(tag, WireType::LengthDelimited, writer)?;
    encode_varint(value.len() as u64, writer)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

#[inline]
fn encoded_len_varint(value: u64) -> usize {
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

#[inline]
fn key_len(tag: u32) -> usize {
    encoded_len_varint(u64::from(tag << 3))
}

#[inline]
fn encoded_str_len(tag: u32, value: impl AsRef<str>) -> usize {
    let value = value.as_ref();
    key_len(tag) + encoded_len_varint(value.len() as u64) + value.len()
}

#[inline]
fn encoded_len_repeated<I, M>(tag: u32, messages: I, len: usize) -> usize
where
    I: Iterator<Item = M>,
    M: Message,
{
    key_len(tag) * len
        + messages
            .map(|m| m.encoded_len())
            .map(|len| len + encoded_len_varint(len as u64))
            .sum::<usize>()
}

#[inline]
fn encoded_varint_field_len(tag: u32, value: u64) -> usize {
    key_len(tag) + encoded_len_varint(value)
}
