use derive_ctor::ctor;
use getset::CopyGetters;

use crate::{
    EDL_CMD_REQ_RES_EVT, EDL_EVENT_HEADER_SIZE, EDL_PATCH_CMD_OPCODE, EDL_PATCH_TLV_REQ_CMD,
    EDL_TVL_DNLD_RES_EVT, Event, Result, Transport,
    commands::Command,
    err::{Error, SegmentFault},
};

/// Result byte after the EDL header
pub const SEGMENT_RESPONSE_SIZE: usize = 1;

/// Largest segment that still fits a command with the tag and length bytes in front
pub const MAX_SEGMENT_LIMIT: u8 = u8::MAX - 2;

/// How a buffer is cut into segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SegmentPlan {
    /// Segments of exactly `max_segment` bytes
    full: usize,
    /// Size of the trailing partial segment, 0 when there is none
    remainder: usize,
}

impl SegmentPlan {
    #[must_use]
    pub fn new(size: usize, max_segment: usize) -> Self {
        Self {
            full: size / max_segment,
            remainder: size % max_segment,
        }
    }

    /// Number of commands needed
    #[must_use]
    pub fn count(&self) -> usize {
        self.full + usize::from(self.remainder != 0)
    }
}

/// A command carrying one TLV segment, built by [`send_segments`] only
#[derive(ctor)]
#[ctor(pub(crate) new)]
pub struct SendSegment<'a> {
    /// Position of the segment in the image, for diagnostics
    index: usize,
    /// Segment bytes, at most [`MAX_SEGMENT_LIMIT`]
    data: &'a [u8],
}

impl SendSegment<'_> {
    fn reject(&self, fault: SegmentFault) -> Error {
        log::error!(target: "qca", "QCA TLV segment #{} rejected: {fault}", self.index);
        Error::SegmentRejected {
            index: self.index,
            fault,
        }
    }
}

impl Command for SendSegment<'_> {
    type Output = ();

    const OPCODE: u16 = EDL_PATCH_CMD_OPCODE;
    const EVENT: Event = Event::Vendor;

    fn payload(&self) -> Vec<u8> {
        let mut cmd = Vec::with_capacity(self.data.len() + 2);
        cmd.push(EDL_PATCH_TLV_REQ_CMD);
        cmd.push(self.data.len() as u8);
        cmd.extend_from_slice(self.data);
        cmd
    }

    fn parse(&self, response: &[u8]) -> Result<Self::Output> {
        let expected = EDL_EVENT_HEADER_SIZE + SEGMENT_RESPONSE_SIZE;
        if response.len() != expected {
            return Err(self.reject(SegmentFault::Size {
                expected,
                actual: response.len(),
            }));
        }

        let (cresp, rtype, result) = (response[0], response[1], response[2]);
        if cresp != EDL_CMD_REQ_RES_EVT || rtype != EDL_TVL_DNLD_RES_EVT {
            Err(self.reject(SegmentFault::Event { cresp, rtype }))
        } else if result != 0x00 {
            Err(self.reject(SegmentFault::Status(result)))
        } else {
            Ok(())
        }
    }
}

/// Push `data` to the controller in segments of at most `max_segment` bytes.
///
/// Segments go out strictly in order and each response is checked before the next segment is
/// sent. The first failure ends the transfer. Returns the number of segments sent.
pub fn send_segments<T: Transport + ?Sized>(
    transport: &mut T,
    data: &[u8],
    max_segment: u8,
) -> Result<usize> {
    if max_segment == 0 || max_segment > MAX_SEGMENT_LIMIT {
        return Err(Error::InvalidArgument("segment size must be within 1..=253"));
    }

    let plan = SegmentPlan::new(data.len(), max_segment as usize);
    log::debug!(
        target: "qca",
        "Total segment num {} remain size {} total size {}",
        plan.full(),
        plan.remainder(),
        data.len()
    );

    for (index, chunk) in data.chunks(max_segment as usize).enumerate() {
        log::debug!(target: "qca", "Download segment #{index} size {}", chunk.len());
        SendSegment::new(index, chunk)
            .run(transport)
            .inspect_err(|e| {
                if let Error::Transport(e) = e {
                    log::error!(target: "qca", "QCA Failed to send TLV segment #{index}: {e}");
                }
            })?;
    }

    Ok(plan.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_SIZE_PER_TLV_SEGMENT, tests::Scripted};

    const OK: [u8; 3] = [EDL_CMD_REQ_RES_EVT, EDL_TVL_DNLD_RES_EVT, 0x00];

    fn sent_chunks(transport: &Scripted) -> Vec<Vec<u8>> {
        transport
            .sent
            .iter()
            .map(|(opcode, payload, event)| {
                assert_eq!(*opcode, EDL_PATCH_CMD_OPCODE);
                assert!(event.is_vendor());
                assert_eq!(payload[0], EDL_PATCH_TLV_REQ_CMD);
                assert_eq!(payload[1] as usize, payload.len() - 2);
                payload[2..].to_vec()
            })
            .collect()
    }

    #[test]
    fn plan_counts_partial_segment() {
        assert_eq!(SegmentPlan::new(486, 243).count(), 2);
        assert_eq!(SegmentPlan::new(487, 243), SegmentPlan { full: 2, remainder: 1 });
        assert_eq!(SegmentPlan::new(487, 243).count(), 3);
        assert_eq!(SegmentPlan::new(0, 243).count(), 0);
    }

    #[test]
    fn largest_segment_keeps_its_length_byte() {
        let data = [0xa5; MAX_SEGMENT_LIMIT as usize];
        let payload = SendSegment::new(0, &data).payload();

        assert_eq!(payload.len(), MAX_SEGMENT_LIMIT as usize + 2);
        assert_eq!(payload[0], EDL_PATCH_TLV_REQ_CMD);
        assert_eq!(payload[1], MAX_SEGMENT_LIMIT);
    }

    #[test]
    fn segments_reassemble_to_input() {
        let data = (0..1000u32).map(|i| (i * 7) as u8).collect::<Vec<_>>();

        for max in [1u8, 7, 100, MAX_SIZE_PER_TLV_SEGMENT, MAX_SEGMENT_LIMIT] {
            let plan = SegmentPlan::new(data.len(), max as usize);
            let mut transport = Scripted::new(std::iter::repeat_n(OK.to_vec(), plan.count()));

            let sent = send_segments(&mut transport, &data, max).unwrap();
            assert_eq!(sent, plan.count());

            let chunks = sent_chunks(&transport);
            assert_eq!(chunks.len(), plan.count());
            assert!(chunks[..plan.full()].iter().all(|c| c.len() == max as usize));
            assert_eq!(chunks.concat(), data);
        }
    }

    #[test]
    fn exact_multiple_has_no_partial_segment() {
        let data = [0x5a; 486];
        let mut transport = Scripted::new([OK.to_vec(), OK.to_vec()]);

        assert_eq!(send_segments(&mut transport, &data, 243).unwrap(), 2);
        assert!(sent_chunks(&transport).iter().all(|c| c.len() == 243));
    }

    #[test]
    fn rejected_segment_stops_transfer() {
        let data = [0x11; 243 * 4];
        let mut transport = Scripted::new([
            OK.to_vec(),
            OK.to_vec(),
            vec![EDL_CMD_REQ_RES_EVT, EDL_TVL_DNLD_RES_EVT, 0x05],
            OK.to_vec(),
        ]);

        match send_segments(&mut transport, &data, 243) {
            Err(Error::SegmentRejected {
                index: 2,
                fault: SegmentFault::Status(0x05),
            }) => (),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.sent.len(), 3);
    }

    #[test]
    fn wrong_response_shape_is_rejected() {
        let cases: [(Vec<u8>, fn(&SegmentFault) -> bool); 4] = [
            (vec![0x00, 0x04], SegmentFault::is_size),
            (vec![0x00, 0x04, 0x00, 0x00], SegmentFault::is_size),
            (vec![0x01, 0x04, 0x00], SegmentFault::is_event),
            (vec![0x00, 0x02, 0x00], SegmentFault::is_event),
        ];

        for (response, check) in cases {
            let mut transport = Scripted::new([response]);
            match send_segments(&mut transport, &[0; 10], 243) {
                Err(Error::SegmentRejected { index: 0, fault }) => assert!(check(&fault)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn transport_failure_aborts() {
        let mut transport = Scripted::new([OK.to_vec()]);
        let err = send_segments(&mut transport, &[0; 300], 243).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn invalid_segment_size() {
        let mut transport = Scripted::default();
        assert!(
            send_segments(&mut transport, &[0; 10], 0)
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(
            send_segments(&mut transport, &[0; 10], 254)
                .unwrap_err()
                .is_invalid_argument()
        );
        assert!(transport.sent.is_empty());
    }
}
