//! High-level representation of the MediaTek DA structure
//!
//! Intended for end use.
use std::fmt::Display;

use chrono::NaiveDateTime;
use getset::Getters;
use regex::Regex;

use crate::{
    HLParser, LLParser, Result,
    da::{
        err::Error,
        ll::{self, ENTRY_SIZE},
    },
};

const TIMESTAMP: &str = r"\d{4}/\d{2}/\d{2}\.\d{2}:\d{2}";
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d.%H:%M";

#[derive(Debug, Getters)]
pub struct DA {
    /// Raw ID string
    #[getset(get = "pub")]
    id: String,

    /// ID without the build timestamp, usable as a file name
    #[getset(get = "pub")]
    name: String,

    /// Build timestamp embedded into the ID
    #[getset(get = "pub")]
    timestamp: Option<NaiveDateTime>,

    #[getset(get = "pub")]
    version: u32,

    #[getset(get = "pub")]
    magic: [u8; 4],

    /// Chip count declared by the header
    #[getset(get = "pub")]
    soc_count: u32,

    /// Valid chip entries
    #[getset(get = "pub")]
    entries: Vec<Entry>,

    /// Chip entries that couldn't be parsed
    #[getset(get = "pub")]
    skipped: Vec<Skipped>,

    /// Everything after the chip table
    #[getset(get = "pub")]
    body: Vec<u8>,
}

/// Chip entry that was not parsed.
#[derive(Debug)]
pub enum Skipped {
    /// File ends before the entry does, the rest of the table is missing too
    Truncated(usize),
    /// Entry doesn't start with `DA DA`
    Invalid(usize, Error),
}

impl Display for Skipped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated(i) => write!(f, "Unexpected end of file at chip {i}"),
            Self::Invalid(i, e) => write!(f, "{e} for chip {i}"),
        }
    }
}

impl HLParser<ll::Header> for DA {
    fn parse(data: &[u8], position: usize, ll: ll::Header) -> Result<Self> {
        ll.validate()?;

        let end = ll.id.iter().rposition(|b| *b != 0).map_or(0, |p| p + 1);
        let id = &ll.id[..end];
        if !id.is_ascii() {
            return Err(Error::InvalidId.into());
        }
        let id = String::from_utf8_lossy(id).into_owned();

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for i in 0..ll.soc_count as usize {
            let start = position + i * ENTRY_SIZE;
            let Some(raw) = data.get(start..start + ENTRY_SIZE) else {
                skipped.push(Skipped::Truncated(i));
                break;
            };

            let ll = ll::Entry::parse(raw)?;
            match Entry::parse(raw, 0, ll) {
                Ok(entry) => entries.push(entry),
                Err(crate::err::Error::DA(e)) => skipped.push(Skipped::Invalid(i, e)),
                Err(e) => return Err(e),
            }
        }

        let body_start = (ll.soc_count as usize)
            .checked_mul(ENTRY_SIZE)
            .and_then(|table| table.checked_add(position))
            .map_or(data.len(), |end| end.min(data.len()));

        Ok(Self {
            name: sanitize(&id)?,
            timestamp: timestamp(&id)?,
            id,
            version: ll.version,
            magic: ll.magic,
            soc_count: ll.soc_count,
            entries,
            skipped,
            body: data[body_start..].to_vec(),
        })
    }
}

fn timestamp(id: &str) -> Result<Option<NaiveDateTime>> {
    let re = Regex::new(&format!("({TIMESTAMP})"))?;
    Ok(re
        .captures(id)
        .and_then(|c| NaiveDateTime::parse_from_str(&c[1], TIMESTAMP_FORMAT).ok()))
}

fn sanitize(id: &str) -> Result<String> {
    let id = Regex::new(&format!("_{TIMESTAMP}"))?.replace_all(id, "");
    let id = Regex::new(TIMESTAMP)?.replace_all(&id, "");
    let id = id.replace(['/', '.'], "_");
    let id = Regex::new("_+")?.replace_all(&id, "_");
    Ok(id.trim_matches('_').to_string())
}

impl Display for DA {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DA ID: {}", self.name)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(
            f,
            "Magic Number: {}",
            self.magic.iter().map(|b| format!("{b:02x}")).collect::<String>()
        )?;
        writeln!(f, "Number of SoCs: {}", self.soc_count)?;
        match self.timestamp {
            Some(t) => write!(f, "Timestamp: {}", t.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "Timestamp: Unknown"),
        }
    }
}

impl DA {
    /// Get chip entry by `chip_id`
    #[must_use]
    pub fn chip(&self, chip_id: u16) -> Option<&Entry> {
        self.entries.iter().find(|e| e.chip_id == chip_id)
    }

    /// Chip table in CSV
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("Chip ID,Chip Version,Firmware Version,Extra Version\n");
        for entry in &self.entries {
            csv.push_str(&format!(
                "MT{:X},{:#X},{:#X},{:#X}\n",
                entry.chip_id, entry.chip_version, entry.firmware_version, entry.extra_version
            ));
        }
        csv
    }
}

#[derive(Debug, Getters)]
pub struct Entry {
    /// SoC hwcode
    #[getset(get = "pub")]
    chip_id: u16,

    #[getset(get = "pub")]
    chip_version: u32,

    #[getset(get = "pub")]
    firmware_version: u32,

    #[getset(get = "pub")]
    extra_version: u32,
}

impl HLParser<ll::Entry> for Entry {
    fn parse(_data: &[u8], _position: usize, ll: ll::Entry) -> Result<Self> {
        ll.validate()?;
        Ok(Self {
            chip_id: ll.chip_id,
            chip_version: ll.chip_version,
            firmware_version: ll.firmware_version,
            extra_version: ll.extra_version,
        })
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Chip ID: MT{:X}", self.chip_id)?;
        writeln!(f, "Chip Version: {:#X}", self.chip_version)?;
        writeln!(f, "Firmware Version: {:#X}", self.firmware_version)?;
        write!(f, "Extra Version: {:#X}", self.extra_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        da::ll::{ENTRY_MAGIC, HEADER_MAGIC, HEADER_SIZE},
        parse_da,
    };

    fn header(id: &str, version: u32, magic: [u8; 4], count: u32) -> Vec<u8> {
        let mut data = vec![0; 0x20];
        let mut raw_id = id.as_bytes().to_vec();
        raw_id.resize(0x40, 0);
        data.extend(raw_id);
        data.extend(version.to_le_bytes());
        data.extend(magic);
        data.extend(count.to_le_bytes());
        data
    }

    fn entry(magic: [u8; 2], chip_id: u16, chip_version: u32, fw: u32, extra: u32) -> Vec<u8> {
        let mut data = magic.to_vec();
        data.extend(chip_id.to_le_bytes());
        data.extend(chip_version.to_le_bytes());
        data.extend(fw.to_le_bytes());
        data.extend(extra.to_le_bytes());
        data.resize(ENTRY_SIZE, 0xff);
        data
    }

    const ID: &str = "MTK_AllInOne_DA_v3.3001.2015/04/15.14:20_123456";

    #[test]
    fn parses_header_and_chips() {
        let data = [
            header(ID, 4, HEADER_MAGIC, 2),
            entry(ENTRY_MAGIC, 0x6572, 0xca00, 0x0, 0x1),
            entry(ENTRY_MAGIC, 0x6580, 0xca01, 0x2, 0x3),
            vec![0xde, 0xad, 0xbe, 0xef],
        ]
        .concat();
        assert_eq!(HEADER_SIZE, header(ID, 4, HEADER_MAGIC, 0).len());

        let da = parse_da(&data).unwrap();
        assert_eq!(da.id(), ID);
        assert_eq!(da.name(), "MTK_AllInOne_DA_v3_3001_123456");
        assert_eq!(
            da.timestamp().unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2015-04-15 14:20"
        );
        assert_eq!(da.entries().len(), 2);
        assert_eq!(*da.chip(0x6580).unwrap().chip_version(), 0xca01);
        assert_eq!(da.body(), &[0xde, 0xad, 0xbe, 0xef]);
        assert!(da.skipped().is_empty());

        let csv = da.to_csv();
        assert!(csv.starts_with("Chip ID,Chip Version"));
        assert!(csv.contains("MT6572,0xCA00,0x0,0x1\n"));
    }

    #[test]
    fn skips_bad_and_truncated_entries() {
        let data = [
            header("DA", 4, HEADER_MAGIC, 3),
            entry([0x00, 0x00], 0x6572, 0, 0, 0),
            entry(ENTRY_MAGIC, 0x6580, 0, 0, 0),
            vec![0xda, 0xda, 0x00],
        ]
        .concat();

        let da = parse_da(&data).unwrap();
        assert_eq!(da.entries().len(), 1);
        assert!(matches!(da.skipped()[0], Skipped::Invalid(0, Error::InvalidEntryMagic(_))));
        assert!(matches!(da.skipped()[1], Skipped::Truncated(2)));
        assert!(da.body().is_empty());
        assert_eq!(da.timestamp(), &None);
    }

    #[test]
    fn huge_chip_count_stops_at_end_of_file() {
        let data = [
            header("DA", 4, HEADER_MAGIC, 0x1000_0000),
            entry(ENTRY_MAGIC, 0x6572, 0, 0, 0),
        ]
        .concat();

        let da = parse_da(&data).unwrap();
        assert_eq!(*da.soc_count(), 0x1000_0000);
        assert_eq!(da.entries().len(), 1);
        assert_eq!(da.skipped().len(), 1);
        assert!(matches!(da.skipped()[0], Skipped::Truncated(1)));
        assert!(da.body().is_empty());

        let da = parse_da(&header("DA", 4, HEADER_MAGIC, u32::MAX)).unwrap();
        assert!(da.entries().is_empty());
        assert!(matches!(da.skipped()[..], [Skipped::Truncated(0)]));
    }

    #[test]
    fn rejects_bad_header() {
        assert!(matches!(
            parse_da(&[0; 0x10]),
            Err(crate::err::Error::DA(Error::TooShort(0x10, 0x6c)))
        ));
        assert!(matches!(
            parse_da(&header("DA", 3, HEADER_MAGIC, 0)),
            Err(crate::err::Error::DA(Error::UnsupportedVersion(3)))
        ));
        assert!(matches!(
            parse_da(&header("DA", 4, [0x22, 0x66, 0x88, 0x99], 0)),
            Err(crate::err::Error::DA(Error::InvalidHeaderMagic(_)))
        ));
    }
}
