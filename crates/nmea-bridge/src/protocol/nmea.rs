use nom::{
    bytes::complete::{take_while, take_while1, take_while_m_n},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map_res, opt},
    multi::many0,
    sequence::preceded,
    Finish, IResult,
};

use crate::{BridgeResult, Error};

/// Sentence address: the word between `$` and the first comma.
///
/// Standard sentences carry a two letter talker id followed by a three letter sentence type
/// (`GPRMC`, `GNRMC`). Proprietary sentences start with `P`, then a three letter manufacturer
/// code, then whatever the manufacturer uses as a subtype (`PGRMZ` is Garmin subtype `Z`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Talker { talker: String, kind: String },
    Proprietary { manufacturer: String, kind: String },
    Other(String),
}

impl Address {
    fn from_word(word: &str) -> Self {
        if let Some(rest) = word.strip_prefix('P') {
            if rest.len() >= 3 {
                let (manufacturer, kind) = rest.split_at(3);
                return Address::Proprietary {
                    manufacturer: manufacturer.to_string(),
                    kind: kind.to_string(),
                };
            }
        }
        if word.len() == 5 {
            let (talker, kind) = word.split_at(2);
            return Address::Talker {
                talker: talker.to_string(),
                kind: kind.to_string(),
            };
        }
        Address::Other(word.to_string())
    }
}

/// A structurally valid NMEA 0183 sentence. Fields are kept as raw text; decoding them is the
/// job of [`crate::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub address: Address,
    pub fields: Vec<String>,
    pub checksum: Option<u8>,
}

impl Sentence {
    /// Comma field by position, counting from zero after the address.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Positional access the way proprietary sentences are laid out: index 0 is the subtype
    /// that follows the manufacturer code, index n is the nth comma field.
    pub fn proprietary_field(&self, index: usize) -> Option<&str> {
        match &self.address {
            Address::Proprietary { kind, .. } => match index {
                0 => Some(kind.as_str()),
                n => self.field(n - 1),
            },
            _ => None,
        }
    }
}

/// Parse one line from the receiver. The line must start with `$`; trailing CR/LF is allowed.
/// A checksum, when present, must match.
pub fn parse(line: &str) -> BridgeResult<Sentence> {
    let (_, (word, fields, checksum, body)) = all_consuming(nom_parse)(line)
        .finish()
        .map_err(Error::from)?;

    if let Some(expected) = checksum {
        let computed = checksum_of(body);
        if computed != expected {
            return Err(Error::Checksum { expected, computed });
        }
    }

    Ok(Sentence {
        address: Address::from_word(word),
        fields: fields.into_iter().map(str::to_string).collect(),
        checksum,
    })
}

type RawSentence<'a> = (&'a str, Vec<&'a str>, Option<u8>, &'a str);

fn nom_parse(line: &str) -> IResult<&str, RawSentence<'_>> {
    let (body_start, _) = char('$')(line)?;
    let (rest, word) = take_while1(|c: char| c.is_ascii_alphanumeric())(body_start)?;
    let (rest, fields) = many0(preceded(char(','), field))(rest)?;
    let body = &body_start[..body_start.len() - rest.len()];
    let (rest, checksum) = opt(preceded(char('*'), hex_byte))(rest)?;
    let (rest, _) = multispace0(rest)?;
    Ok((rest, (word, fields, checksum, body)))
}

fn field(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| !matches!(c, ',' | '*' | '$' | '\r' | '\n'))(input)
}

fn hex_byte(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |hex: &str| u8::from_str_radix(hex, 16),
    )(input)
}

/// NMEA checksum: XOR of every byte between `$` and `*`.
pub fn checksum_of(body: &str) -> u8 {
    body.bytes().fold(0, |acc, byte| acc ^ byte)
}
