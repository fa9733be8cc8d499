//! Flyweights for the commands exchanged between clients and the driver.
//!
//! Each flyweight is a typed view on a message at some base offset inside a larger buffer,
//!  typically the shared command buffer. Encoding means binding a flyweight to an (empty) slot
//!  and calling its setters; decoding means binding the same flyweight type to the bytes that
//!  were received and calling its getters. Nothing is copied, and nothing is staged: setters write
//!  through to the buffer.
//!
//! The kind of a message is not part of the message itself. It is carried by the framing
//!  of the surrounding command buffer, and [Command::decode] turns it into the matching
//!  flyweight.

use anyhow::anyhow;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::trace;
use crate::buffers::{BufferError, RawBuf};

pub mod correlated_message;
pub mod flyweight;
pub mod image_buffers_ready;
pub mod image_message;
pub mod publication_buffers_ready;
pub mod publication_message;
pub mod remove_message;
pub mod subscription_message;

pub use image_buffers_ready::ImageBuffersReadyFlyweight;
pub use image_message::ImageMessageFlyweight;
pub use publication_buffers_ready::PublicationBuffersReadyFlyweight;
pub use publication_message::PublicationMessageFlyweight;
pub use remove_message::RemoveMessageFlyweight;
pub use subscription_message::SubscriptionMessageFlyweight;

/// Type ids of commands: ids below 0x0F00 are sent by clients, the others by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum CommandKind {
    AddPublication = 0x01,
    RemovePublication = 0x02,
    AddExclusivePublication = 0x03,
    AddSubscription = 0x04,
    RemoveSubscription = 0x05,

    OnAvailableImage = 0x0F02,
    OnPublicationReady = 0x0F03,
    OnUnavailableImage = 0x0F05,
    OnExclusivePublicationReady = 0x0F06,
}

impl CommandKind {
    pub fn is_sent_by_driver(self) -> bool {
        i32::from(self) >= 0x0F00
    }
}

pub enum Command<B> {
    Publication(PublicationMessageFlyweight<B>),
    Subscription(SubscriptionMessageFlyweight<B>),
    Remove(RemoveMessageFlyweight<B>),
    PublicationBuffersReady(PublicationBuffersReadyFlyweight<B>),
    ImageBuffersReady(ImageBuffersReadyFlyweight<B>),
    Image(ImageMessageFlyweight<B>),
}

impl<B: AsRef<[u8]>> Command<B> {
    /// Binds the flyweight that carries commands of the given kind
    pub fn wrap(kind: CommandKind, buffer: RawBuf<B>, offset: usize) -> Result<Command<B>, BufferError> {
        let command = match kind {
            CommandKind::AddPublication |
            CommandKind::AddExclusivePublication => Command::Publication(PublicationMessageFlyweight::new(buffer, offset)?),
            CommandKind::AddSubscription => Command::Subscription(SubscriptionMessageFlyweight::new(buffer, offset)?),
            CommandKind::RemovePublication |
            CommandKind::RemoveSubscription => Command::Remove(RemoveMessageFlyweight::new(buffer, offset)?),
            CommandKind::OnPublicationReady |
            CommandKind::OnExclusivePublicationReady => Command::PublicationBuffersReady(PublicationBuffersReadyFlyweight::new(buffer, offset)?),
            CommandKind::OnAvailableImage => Command::ImageBuffersReady(ImageBuffersReadyFlyweight::new(buffer, offset)?),
            CommandKind::OnUnavailableImage => Command::Image(ImageMessageFlyweight::new(buffer, offset)?),
        };
        Ok(command)
    }

    /// Binds the flyweight for a raw type id as it was read from the command buffer's framing.
    ///  Unknown type ids are rejected.
    pub fn decode(type_id: i32, buffer: RawBuf<B>, offset: usize) -> anyhow::Result<Command<B>> {
        let kind = CommandKind::try_from(type_id)
            .map_err(|_| anyhow!("unknown command type id {:#x} at offset {}", type_id, offset))?;
        trace!("decoding {:?} at offset {}", kind, offset);
        Ok(Self::wrap(kind, buffer, offset)?)
    }

    pub fn offset(&self) -> usize {
        match self {
            Command::Publication(cmd) => cmd.offset(),
            Command::Subscription(cmd) => cmd.offset(),
            Command::Remove(cmd) => cmd.offset(),
            Command::PublicationBuffersReady(cmd) => cmd.offset(),
            Command::ImageBuffersReady(cmd) => cmd.offset(),
            Command::Image(cmd) => cmd.offset(),
        }
    }

    /// The encoded length of the message, computed from the buffer's current contents
    pub fn length(&self) -> Result<usize, BufferError> {
        match self {
            Command::Publication(cmd) => cmd.length(),
            Command::Subscription(cmd) => cmd.length(),
            Command::Remove(cmd) => cmd.length(),
            Command::PublicationBuffersReady(cmd) => cmd.length(),
            Command::ImageBuffersReady(cmd) => cmd.length(),
            Command::Image(cmd) => cmd.length(),
        }
    }
}


#[cfg(test)]
mod tests {
    use rand::Rng;
    use rstest::rstest;
    use super::*;

    const BASE_OFFSET: usize = 256;

    fn variant_name<B>(command: &Command<B>) -> &'static str {
        match command {
            Command::Publication(_) => "Publication",
            Command::Subscription(_) => "Subscription",
            Command::Remove(_) => "Remove",
            Command::PublicationBuffersReady(_) => "PublicationBuffersReady",
            Command::ImageBuffersReady(_) => "ImageBuffersReady",
            Command::Image(_) => "Image",
        }
    }

    #[rstest]
    #[case::add_publication(CommandKind::AddPublication, "Publication")]
    #[case::add_exclusive_publication(CommandKind::AddExclusivePublication, "Publication")]
    #[case::add_subscription(CommandKind::AddSubscription, "Subscription")]
    #[case::remove_publication(CommandKind::RemovePublication, "Remove")]
    #[case::remove_subscription(CommandKind::RemoveSubscription, "Remove")]
    #[case::on_publication_ready(CommandKind::OnPublicationReady, "PublicationBuffersReady")]
    #[case::on_exclusive_publication_ready(CommandKind::OnExclusivePublicationReady, "PublicationBuffersReady")]
    #[case::on_available_image(CommandKind::OnAvailableImage, "ImageBuffersReady")]
    #[case::on_unavailable_image(CommandKind::OnUnavailableImage, "Image")]
    fn test_wrap_over_zeroed_buffer(#[case] kind: CommandKind, #[case] expected: &str) {
        let data = [0u8; 1024];
        let command = Command::wrap(kind, RawBuf::new(&data[..]), BASE_OFFSET).unwrap();
        assert_eq!(variant_name(&command), expected);
        assert_eq!(command.offset(), BASE_OFFSET);
    }

    #[rstest]
    #[case::add_publication(0x01, CommandKind::AddPublication)]
    #[case::remove_subscription(0x05, CommandKind::RemoveSubscription)]
    #[case::on_available_image(0x0F02, CommandKind::OnAvailableImage)]
    #[case::on_exclusive_publication_ready(0x0F06, CommandKind::OnExclusivePublicationReady)]
    fn test_kind_type_ids(#[case] type_id: i32, #[case] kind: CommandKind) {
        assert_eq!(CommandKind::try_from(type_id).unwrap(), kind);
        assert_eq!(i32::from(kind), type_id);
    }

    #[rstest]
    #[case::add_publication(CommandKind::AddPublication, false)]
    #[case::remove_subscription(CommandKind::RemoveSubscription, false)]
    #[case::on_available_image(CommandKind::OnAvailableImage, true)]
    #[case::on_unavailable_image(CommandKind::OnUnavailableImage, true)]
    fn test_is_sent_by_driver(#[case] kind: CommandKind, #[case] expected: bool) {
        assert_eq!(kind.is_sent_by_driver(), expected);
    }

    #[rstest]
    #[case::zero(0)]
    #[case::client_keepalive(0x06)]
    #[case::on_error(0x0F01)]
    #[case::negative(-1)]
    fn test_decode_unknown_type_id(#[case] type_id: i32) {
        let data = [0u8; 1024];
        assert!(Command::decode(type_id, RawBuf::new(&data[..]), 0).is_err());
    }

    #[rstest]
    #[case::remove(CommandKind::RemovePublication, 24)]
    #[case::image(CommandKind::OnUnavailableImage, 12)]
    #[case::publication(CommandKind::AddPublication, 20)]
    #[case::subscription(CommandKind::AddSubscription, 28)]
    #[case::publication_ready(CommandKind::OnPublicationReady, 28)]
    #[case::image_ready(CommandKind::OnAvailableImage, 32)]
    fn test_wrap_header_must_fit(#[case] kind: CommandKind, #[case] header_length: usize) {
        let data = [0u8; 64];
        assert!(Command::wrap(kind, RawBuf::new(&data[..]), 64 - header_length).is_ok());

        let err = Command::wrap(kind, RawBuf::new(&data[..]), 65 - header_length).err();
        assert_eq!(err, Some(BufferError::OutOfBounds { offset: 65 - header_length, width: header_length, capacity: 64 }));
    }

    #[test]
    fn test_length_of_zeroed_messages() {
        let data = [0u8; 1024];
        let lengths = [
            (CommandKind::AddPublication, 24),
            (CommandKind::AddSubscription, 32),
            (CommandKind::RemoveSubscription, 24),
            (CommandKind::OnPublicationReady, 32),
            (CommandKind::OnAvailableImage, 40),
            (CommandKind::OnUnavailableImage, 16),
        ];
        for (kind, expected) in lengths {
            let command = Command::wrap(kind, RawBuf::new(&data[..]), BASE_OFFSET).unwrap();
            assert_eq!(command.length().unwrap(), expected, "{:?}", kind);
        }
    }

    /// several messages in disjoint slots of one buffer, framed the way a command buffer would
    ///  frame them: type id and length in front of each message
    #[test]
    fn test_decode_back_to_back_messages() {
        let mut rng = rand::thread_rng();
        let mut data = vec![0u8; 4096];

        let correlation_ids: Vec<i64> = (0..3).map(|_| rng.gen()).collect();
        let stream_id: i32 = rng.gen();
        let session_id: i32 = rng.gen();
        let channel = format!("aeron:udp?endpoint=localhost:{}", rng.gen_range(1024..65535));

        let mut frames = Vec::new();

        let msg_offset = 8;
        let len = {
            let mut cmd = PublicationMessageFlyweight::new(RawBuf::new(&mut data[..]), msg_offset).unwrap();
            cmd.set_client_id(1).unwrap()
                .set_correlation_id(correlation_ids[0]).unwrap()
                .set_stream_id(stream_id).unwrap()
                .set_channel(&channel).unwrap();
            cmd.length().unwrap()
        };
        assert_eq!(len, publication_message::compute_length(&channel));
        frames.push((CommandKind::AddPublication, msg_offset, len));

        let msg_offset = ((msg_offset + len + 7) & !7) + 8;
        let len = {
            let mut cmd = PublicationBuffersReadyFlyweight::new(RawBuf::new(&mut data[..]), msg_offset).unwrap();
            cmd.set_correlation_id(correlation_ids[0]).unwrap()
                .set_registration_id(correlation_ids[1]).unwrap()
                .set_session_id(session_id).unwrap()
                .set_stream_id(stream_id).unwrap()
                .set_position_limit_counter_id(7).unwrap()
                .set_log_file_name("/dev/shm/aeron/publications/1.logbuffer").unwrap();
            cmd.length().unwrap()
        };
        frames.push((CommandKind::OnPublicationReady, msg_offset, len));

        let msg_offset = ((msg_offset + len + 7) & !7) + 8;
        let len = {
            let mut cmd = RemoveMessageFlyweight::new(RawBuf::new(&mut data[..]), msg_offset).unwrap();
            cmd.set_client_id(1).unwrap()
                .set_correlation_id(correlation_ids[2]).unwrap()
                .set_registration_id(correlation_ids[1]).unwrap();
            cmd.length().unwrap()
        };
        frames.push((CommandKind::RemovePublication, msg_offset, len));

        {
            let mut buf = RawBuf::new(&mut data[..]);
            for &(kind, msg_offset, len) in &frames {
                buf.put_i32(msg_offset - 8, kind.into()).unwrap();
                buf.put_i32(msg_offset - 4, len as i32).unwrap();
            }
        }

        let buf = RawBuf::new(&data[..]);
        for &(_, msg_offset, len) in &frames {
            let type_id = buf.get_i32(msg_offset - 8).unwrap();
            let command = Command::decode(type_id, RawBuf::new(&data[..]), msg_offset).unwrap();
            assert_eq!(command.length().unwrap(), len);
            assert_eq!(buf.get_i32(msg_offset - 4).unwrap() as usize, len);

            match command {
                Command::Publication(cmd) => {
                    assert_eq!(cmd.client_id().unwrap(), 1);
                    assert_eq!(cmd.correlation_id().unwrap(), correlation_ids[0]);
                    assert_eq!(cmd.stream_id().unwrap(), stream_id);
                    assert_eq!(cmd.channel().unwrap(), channel);
                }
                Command::PublicationBuffersReady(cmd) => {
                    assert_eq!(cmd.correlation_id().unwrap(), correlation_ids[0]);
                    assert_eq!(cmd.registration_id().unwrap(), correlation_ids[1]);
                    assert_eq!(cmd.session_id().unwrap(), session_id);
                    assert_eq!(cmd.stream_id().unwrap(), stream_id);
                    assert_eq!(cmd.position_limit_counter_id().unwrap(), 7);
                    assert_eq!(cmd.log_file_name().unwrap(), "/dev/shm/aeron/publications/1.logbuffer");
                }
                Command::Remove(cmd) => {
                    assert_eq!(cmd.correlation_id().unwrap(), correlation_ids[2]);
                    assert_eq!(cmd.registration_id().unwrap(), correlation_ids[1]);
                }
                _ => panic!("unexpected command kind"),
            }
        }
    }
}
