//! NVM record: tag walk and in-place tag patches
use std::ops::Range;

use getset::CopyGetters;

use crate::{LLParser, Result, err::Error, ll};

/// HCI transport layer parameters
pub const EDL_TAG_ID_HCI: u16 = 17;
/// Sleep enable mask
pub const EDL_TAG_ID_DEEP_SLEEP: u16 = 27;

/// Tag id + tag length + 8 reserved bytes
pub const NVM_TAG_HEADER_SIZE: usize = 12;

/// One tag entry inside an NVM body
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct NvmTag {
    /// Tag id
    #[getset(get_copy = "pub")]
    id: u16,

    /// Payload length
    #[getset(get_copy = "pub")]
    len: u16,

    /// Offset of the tag header from the start of the body
    #[getset(get_copy = "pub")]
    offset: usize,
}

impl NvmTag {
    /// Payload position inside the body
    #[must_use]
    pub fn payload(&self) -> Range<usize> {
        let start = self.offset + NVM_TAG_HEADER_SIZE;
        start..start + self.len as usize
    }
}

/// Walks the tightly packed tag entries of an NVM body.
///
/// Every entry is bound-checked against the body: an entry that would run past the end yields
/// [`Error::MalformedNvmTag`] and ends the walk.
pub struct TagWalker<'a> {
    body: &'a [u8],
    cursor: usize,
    failed: bool,
}

impl<'a> TagWalker<'a> {
    #[must_use]
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            cursor: 0,
            failed: false,
        }
    }

    fn fail(&mut self, error: Error) -> Option<Result<NvmTag>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl Iterator for TagWalker<'_> {
    type Item = Result<NvmTag>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.body.len() {
            return None;
        }

        let offset = self.cursor;
        let available = self.body.len() - offset;
        if available < NVM_TAG_HEADER_SIZE {
            return self.fail(Error::MalformedNvmTag {
                offset,
                tag_id: None,
                needed: NVM_TAG_HEADER_SIZE,
                available,
            });
        }

        let header = match ll::NvmTagHeader::parse(&self.body[offset..]) {
            Ok(header) => header,
            Err(e) => return self.fail(e),
        };

        let needed = NVM_TAG_HEADER_SIZE + header.tag_len as usize;
        if needed > available {
            return self.fail(Error::MalformedNvmTag {
                offset,
                tag_id: Some(header.tag_id),
                needed,
                available,
            });
        }

        self.cursor += needed;
        Some(Ok(NvmTag {
            id: header.tag_id,
            len: header.tag_len,
            offset,
        }))
    }
}

pub trait PatchMessage {
    /// Message when the patch is applied
    fn on_success() -> &'static str;
}

/// A patch rewriting the payload of one well-known tag
pub trait TagPatch: PatchMessage {
    /// Tag the patch applies to
    const TAG_ID: u16;
    /// Payload bytes the patch touches
    const MIN_LEN: usize;

    fn apply(&self, payload: &mut [u8]);
}

/// Enable software inband sleep and set the UART baud rate
pub struct InbandSleep {
    baud_rate: u8,
}

impl PatchMessage for InbandSleep {
    fn on_success() -> &'static str {
        "Enabled inband sleep and set UART baud rate"
    }
}

impl TagPatch for InbandSleep {
    const TAG_ID: u16 = EDL_TAG_ID_HCI;
    const MIN_LEN: usize = 3;

    fn apply(&self, payload: &mut [u8]) {
        payload[0] |= 0x80;
        payload[2] = self.baud_rate;
    }
}

/// Enable the deep sleep feature on the controller
pub struct DeepSleep;

impl PatchMessage for DeepSleep {
    fn on_success() -> &'static str {
        "Enabled deep sleep"
    }
}

impl TagPatch for DeepSleep {
    const TAG_ID: u16 = EDL_TAG_ID_DEEP_SLEEP;
    const MIN_LEN: usize = 1;

    fn apply(&self, payload: &mut [u8]) {
        payload[0] |= 0x01;
    }
}

/// NVM patches
pub enum NvmPatches {
    InbandSleep(InbandSleep),
    DeepSleep(DeepSleep),
}

impl NvmPatches {
    #[inline]
    fn tag_id_internal<T: TagPatch>(_p: &T) -> u16 {
        T::TAG_ID
    }

    #[inline]
    fn min_len_internal<T: TagPatch>(_p: &T) -> usize {
        T::MIN_LEN
    }

    #[inline]
    fn on_success_internal<T: PatchMessage>(_p: &T) -> &'static str {
        T::on_success()
    }

    /// All patches applied to an NVM record
    #[must_use]
    pub fn all(baud_rate: u8) -> Vec<Self> {
        vec![
            Self::InbandSleep(InbandSleep { baud_rate }),
            Self::DeepSleep(DeepSleep),
        ]
    }

    /// Tag the patch applies to
    #[must_use]
    pub fn tag_id(&self) -> u16 {
        match self {
            Self::InbandSleep(p) => Self::tag_id_internal(p),
            Self::DeepSleep(p) => Self::tag_id_internal(p),
        }
    }

    /// Payload bytes the patch touches
    #[must_use]
    pub fn min_len(&self) -> usize {
        match self {
            Self::InbandSleep(p) => Self::min_len_internal(p),
            Self::DeepSleep(p) => Self::min_len_internal(p),
        }
    }

    /// Apply the patch to a tag payload of at least [`Self::min_len`] bytes
    pub fn apply(&self, payload: &mut [u8]) {
        match self {
            Self::InbandSleep(p) => p.apply(payload),
            Self::DeepSleep(p) => p.apply(payload),
        }
    }

    /// Message when the patch is applied
    #[must_use]
    pub fn on_success(&self) -> &'static str {
        match self {
            Self::InbandSleep(p) => Self::on_success_internal(p),
            Self::DeepSleep(p) => Self::on_success_internal(p),
        }
    }
}

/// Walk the NVM `body` and patch the HCI transport and deep sleep tags in place.
///
/// The whole body is walked and checked before the first byte is written, so a malformed body is
/// left untouched. Returns the tags found.
pub fn patch_nvm(body: &mut [u8], baud_rate: u8) -> Result<Vec<NvmTag>> {
    let tags = TagWalker::new(body).collect::<Result<Vec<_>>>()?;
    let patches = NvmPatches::all(baud_rate);

    let targets = tags
        .iter()
        .flat_map(|tag| {
            patches
                .iter()
                .filter(move |p| p.tag_id() == tag.id())
                .map(move |p| (tag, p))
        })
        .collect::<Vec<_>>();

    for (tag, patch) in &targets {
        if (tag.len() as usize) < patch.min_len() {
            return Err(Error::MalformedNvmTag {
                offset: tag.offset(),
                tag_id: Some(tag.id()),
                needed: NVM_TAG_HEADER_SIZE + patch.min_len(),
                available: NVM_TAG_HEADER_SIZE + tag.len() as usize,
            });
        }
    }

    for (tag, patch) in targets {
        log::debug!(target: "qca", "Tag {} at {:#x}: {}", tag.id(), tag.offset(), patch.on_success());
        patch.apply(&mut body[tag.payload()]);
    }

    Ok(tags)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn tag(id: u16, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(NVM_TAG_HEADER_SIZE + payload.len());
        data.extend_from_slice(&id.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0xee; 8]);
        data.extend_from_slice(payload);
        data
    }

    fn sample() -> Vec<u8> {
        let mut body = tag(3, &[0x10, 0x20]);
        body.extend(tag(EDL_TAG_ID_HCI, &[0x01, 0x55, 0x00, 0x77]));
        body.extend(tag(40, &[]));
        body.extend(tag(EDL_TAG_ID_DEEP_SLEEP, &[0x40, 0x99]));
        body
    }

    #[test]
    fn walker_visits_every_tag() {
        let body = sample();
        let tags = TagWalker::new(&body).collect::<Result<Vec<_>>>().unwrap();

        let ids = tags.iter().map(|t| t.id()).collect::<Vec<_>>();
        assert_eq!(ids, [3, EDL_TAG_ID_HCI, 40, EDL_TAG_ID_DEEP_SLEEP]);
        assert_eq!(tags[1].offset(), 14);
        assert_eq!(tags[1].payload(), 26..30);
        assert_eq!(tags[2].len(), 0);
    }

    #[test]
    fn walker_stops_on_overrun() {
        let mut body = tag(5, &[0; 4]);
        body.extend(tag(6, &[0; 10]));
        body.truncate(body.len() - 3);

        let mut walker = TagWalker::new(&body);
        assert!(walker.next().unwrap().is_ok());
        match walker.next() {
            Some(Err(Error::MalformedNvmTag {
                offset,
                tag_id,
                needed,
                available,
            })) => {
                assert_eq!(offset, 16);
                assert_eq!(tag_id, Some(6));
                assert_eq!(needed, 22);
                assert_eq!(available, 19);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(walker.next().is_none());
    }

    #[test]
    fn walker_rejects_truncated_tag_header() {
        let mut body = tag(5, &[]);
        body.extend_from_slice(&[0x11, 0x00, 0x01]);

        let result = TagWalker::new(&body).collect::<Result<Vec<_>>>();
        assert!(matches!(
            result,
            Err(Error::MalformedNvmTag {
                offset: 12,
                tag_id: None,
                ..
            })
        ));
    }

    #[test]
    fn patch_sets_only_known_tag_bits() {
        let mut body = sample();
        let before = body.clone();

        patch_nvm(&mut body, 0x0e).unwrap();

        let mut expected = before.clone();
        expected[26] |= 0x80;
        expected[28] = 0x0e;
        expected[14 + 16 + 12 + 12] |= 0x01;
        assert_eq!(body, expected);
    }

    #[test]
    fn patch_is_idempotent() {
        let mut once = sample();
        patch_nvm(&mut once, 0x0a).unwrap();

        let mut twice = once.clone();
        patch_nvm(&mut twice, 0x0a).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_body_is_not_touched() {
        let mut body = tag(EDL_TAG_ID_HCI, &[0x00, 0x00, 0x00]);
        body.extend(tag(9, &[0; 8]));
        body.truncate(body.len() - 1);
        let before = body.clone();

        assert!(patch_nvm(&mut body, 0x0e).is_err());
        assert_eq!(body, before);
    }

    #[test]
    fn short_hci_payload_is_malformed() {
        let mut body = tag(EDL_TAG_ID_HCI, &[0x00, 0x00]);
        let before = body.clone();

        assert!(matches!(
            patch_nvm(&mut body, 0x0e),
            Err(Error::MalformedNvmTag {
                tag_id: Some(EDL_TAG_ID_HCI),
                needed: 15,
                available: 14,
                ..
            })
        ));
        assert_eq!(body, before);
    }

    #[test]
    fn empty_body_has_no_tags() {
        assert!(patch_nvm(&mut [], 0).unwrap().is_empty());
    }
}
