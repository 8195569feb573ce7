//! The command catalogue.
//!
//! Each entry declares a command (host → device) and its reply
//! (device → host) under the same command code. The parameter layout is
//! the field list in declaration order, encoded as described in
//! [`crate::param`]. Many replies carry no parameters: an empty Return
//! frame is the device's acknowledgement.
//!
//! Types are generated by [`define_message!`] so that the layout, the
//! registry key and the display name are written once.

use crate::message::{KnownMessage, MessageKind};
use crate::param::{ShortBytes, ShortString};

/// Declares one message struct and its `Message`/`KnownMessage` impls.
macro_rules! define_message {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:ident, $code:literal, $title:literal,
        { $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $fty, )*
        }

        impl $crate::message::KnownMessage for $name {
            const CMD_CODE: u8 = $code;
            const MESSAGE_TYPE: $crate::MessageType = $crate::MessageType::$kind;
            const NAME: &'static str = $title;
        }

        impl $crate::message::Message for $name {
            fn name(&self) -> &'static str {
                $title
            }

            fn message_type(&self) -> $crate::MessageType {
                $crate::MessageType::$kind
            }

            fn cmd_code(&self) -> u8 {
                $code
            }

            fn serialize_parameters(&self) -> Vec<u8> {
                #[allow(unused_mut)]
                let mut out = Vec::new();
                $( $crate::param::Param::put(&self.$field, &mut out); )*
                out
            }

            fn deserialize_parameters(
                &mut self,
                params: &[u8],
            ) -> Result<(), $crate::ProtocolError> {
                #[allow(unused_mut, unused_variables)]
                let mut cursor = $crate::param::ParamCursor::new(params);
                $( self.$field = cursor.take()?; )*
                Ok(())
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
    };
}

/// Declares every command/reply pair and the list of their descriptors.
macro_rules! catalogue {
    (
        $(
            $(#[$meta:meta])*
            $cmd:ident / $ret:ident = $code:literal, $title:literal {
                command $cfields:tt
                reply $rfields:tt
            }
        )*
    ) => {
        $(
            define_message! {
                $(#[$meta])*
                $cmd, Command, $code, $title, $cfields
            }
            define_message! {
                #[doc = concat!("Device reply to [`", stringify!($cmd), "`].")]
                $ret, Return, $code, $title, $rfields
            }
        )*

        /// Descriptors for every command and reply in the catalogue.
        pub(crate) fn kinds() -> Vec<MessageKind> {
            vec![ $( <$cmd as KnownMessage>::kind(), <$ret as KnownMessage>::kind(), )* ]
        }
    };
}

catalogue! {
    // ----- Basic -----

    /// Selects the speed of a serial interface.
    SetBaudRate / SetBaudRateReply = 0x01, "Set baud rate" {
        command {
            /// 0 = RS232, 1 = RS485.
            interface_type: u8,
            /// Index into the baud rate table, see [`SetBaudRate::baud_rate`].
            baud_rate_code: u8,
        }
        reply {}
    }

    GetBaudRate / GetBaudRateReply = 0x02, "Get baud rate" {
        command { interface_type: u8 }
        reply { baud_rate_code: u8 }
    }

    SetRs485Address / SetRs485AddressReply = 0x03, "Set RS485 address" {
        command { address: u8 }
        reply {}
    }

    GetRs485Address / GetRs485AddressReply = 0x04, "Get RS485 address" {
        command {}
        reply { address: u8 }
    }

    /// Asks for the firmware version string.
    GetVersionNumber / GetVersionNumberReply = 0x05, "Get version number" {
        command {}
        reply { version_info: String }
    }

    SetRelayStatus / SetRelayStatusReply = 0x06, "Set relay status" {
        command { relay_number: u8, relay_state: u8 }
        reply {}
    }

    GetRelayStatus / GetRelayStatusReply = 0x08, "Get relay status" {
        command { relay_number: u8 }
        reply { relay_state: u8 }
    }

    SetBuzzer / SetBuzzerReply = 0x0B, "Set buzzer" {
        command {
            /// 0 = off, 1 = on.
            state: u8,
        }
        reply {}
    }

    GetBuzzer / GetBuzzerReply = 0x0C, "Get buzzer" {
        command {}
        reply { state: u8 }
    }

    SetCardReadingMode / SetCardReadingModeReply = 0x0D, "Set card reading mode" {
        command { mode: u8 }
        reply {}
    }

    GetCardReadingMode / GetCardReadingModeReply = 0x0E, "Get card reading mode" {
        command {}
        reply { mode: u8 }
    }

    /// Sets the RF output power of one antenna.
    SetOutputPower / SetOutputPowerReply = 0x0F, "Set output power" {
        command { antenna_number: u8, power_value: u8 }
        reply {}
    }

    GetOutputPower / GetOutputPowerReply = 0x10, "Get output power" {
        command { antenna_number: u8 }
        reply { power_value: u8 }
    }

    SetFrequencyPoints / SetFrequencyPointsReply = 0x13, "Set frequency points" {
        command { region: u8, start_freq: u8, end_freq: u8 }
        reply {}
    }

    GetFrequencyPoints / GetFrequencyPointsReply = 0x14, "Get frequency points" {
        command {}
        reply { region: u8, start_freq: u8, end_freq: u8 }
    }

    RestoreFactorySettings / RestoreFactorySettingsReply = 0x17, "Restore factory settings" {
        command {}
        reply {}
    }

    RestartReader / RestartReaderReply = 0x18, "Restart reader" {
        command {}
        reply {}
    }

    RestoreWifiSettings / RestoreWifiSettingsReply = 0x19, "Restore WIFI settings" {
        command {}
        reply {}
    }

    /// Sets the real-time clock. Year is an offset from 2000.
    SetReaderTime / SetReaderTimeReply = 0x1B, "Set reader time" {
        command { year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8 }
        reply {}
    }

    GetReaderTime / GetReaderTimeReply = 0x1C, "Get reader time" {
        command {}
        reply { year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8 }
    }

    /// Restricts inventory to tags whose memory matches a mask.
    SetTagFilter / SetTagFilterReply = 0x1F, "Set tag filter" {
        command {
            is_enabled: u8,
            mask_address: u8,
            /// Mask length in bits.
            mask_length: u8,
            mask_data: Vec<u8>,
        }
        reply {}
    }

    GetTagFilter / GetTagFilterReply = 0x20, "Get tag filter" {
        command {}
        reply { is_enabled: u8, mask_address: u8, mask_length: u8, mask_data: Vec<u8> }
    }

    SetRj45LocalParams / SetRj45LocalParamsReply = 0x23, "Set RJ45 local network parameters" {
        command { ip: [u8; 4], mask: [u8; 4], gateway: [u8; 4], port: u16 }
        reply {}
    }

    GetRj45LocalParams / GetRj45LocalParamsReply = 0x24, "Get RJ45 local network parameters" {
        command {}
        reply { ip: [u8; 4], mask: [u8; 4], gateway: [u8; 4], port: u16 }
    }

    SetMacAddress / SetMacAddressReply = 0x25, "Set MAC address" {
        command { mac: [u8; 6] }
        reply {}
    }

    GetMacAddress / GetMacAddressReply = 0x26, "Get MAC address" {
        command {}
        reply { mac: [u8; 6] }
    }

    SetRj45RemoteParams / SetRj45RemoteParamsReply = 0x27, "Set RJ45 remote network parameters" {
        command {
            udp_server_ip: [u8; 4],
            udp_server_port: u16,
            udp_enabled: u8,
            tcp_server_ip: [u8; 4],
            tcp_server_port: u16,
            tcp_enabled: u8,
        }
        reply {}
    }

    GetRj45RemoteParams / GetRj45RemoteParamsReply = 0x28, "Get RJ45 remote network parameters" {
        command {}
        reply {
            udp_server_ip: [u8; 4],
            udp_server_port: u16,
            udp_enabled: u8,
            tcp_server_ip: [u8; 4],
            tcp_server_port: u16,
            tcp_enabled: u8,
        }
    }

    SetTagAlarm / SetTagAlarmReply = 0x31, "Set tag alarm" {
        command { is_enabled: u8, mask_address: u8, mask_length: u8, mask_data: Vec<u8> }
        reply {}
    }

    GetTagAlarm / GetTagAlarmReply = 0x32, "Get tag alarm" {
        command {}
        reply { is_enabled: u8, mask_address: u8, mask_length: u8, mask_data: Vec<u8> }
    }

    SetReaderId / SetReaderIdReply = 0x33, "Set reader ID" {
        command { reader_id: String }
        reply {}
    }

    GetReaderId / GetReaderIdReply = 0x34, "Get reader ID" {
        command {}
        reply { reader_id: String }
    }

    SetReaderName / SetReaderNameReply = 0x35, "Set reader name" {
        command { reader_name: String }
        reply {}
    }

    GetReaderName / GetReaderNameReply = 0x36, "Get reader name" {
        command {}
        reply { reader_name: String }
    }

    SetHeartbeatPacket / SetHeartbeatPacketReply = 0x39, "Set heartbeat packet parameters" {
        command {
            is_enabled: u8,
            /// Seconds between heartbeats.
            interval: u8,
            heartbeat_data: String,
        }
        reply {}
    }

    GetHeartbeatPacket / GetHeartbeatPacketReply = 0x43, "Get heartbeat packet parameters" {
        command {}
        reply { is_enabled: u8, interval: u8, heartbeat_data: String }
    }

    SetWifiParams / SetWifiParamsReply = 0x4D, "Set WIFI parameters" {
        command {
            wifi_mode: u8,
            local_ip: [u8; 4],
            subnet_mask: [u8; 4],
            gateway: [u8; 4],
            port: u16,
            remote_ip: [u8; 4],
            ssid: ShortString,
            password: ShortString,
        }
        reply {}
    }

    GetWifiParams / GetWifiParamsReply = 0x4E, "Get WIFI parameters" {
        command {}
        reply {
            wifi_mode: u8,
            local_ip: [u8; 4],
            subnet_mask: [u8; 4],
            gateway: [u8; 4],
            port: u16,
            remote_ip: [u8; 4],
            ssid: ShortString,
            password: ShortString,
        }
    }

    SetSuperNetworkParams / SetSuperNetworkParamsReply = 0x4F, "Set super network port parameters" {
        command {
            mode: u8,
            ip_address: [u8; 4],
            subnet_mask: [u8; 4],
            gateway: [u8; 4],
            port: u16,
            remote_ip: [u8; 4],
        }
        reply {}
    }

    GetSuperNetworkParams / GetSuperNetworkParamsReply = 0x50, "Get super network port parameters" {
        command {}
        reply {
            mode: u8,
            ip_address: [u8; 4],
            subnet_mask: [u8; 4],
            gateway: [u8; 4],
            port: u16,
            remote_ip: [u8; 4],
        }
    }

    Set4gParams / Set4gParamsReply = 0x51, "Set 4G parameters" {
        command { transmission_mode: u8, port: u16, address: ShortString }
        reply {}
    }

    Get4gParams / Get4gParamsReply = 0x52, "Get 4G parameters" {
        command {}
        reply { transmission_mode: u8, port: u16, address: ShortString }
    }

    GetGpiStatus / GetGpiStatusReply = 0x60, "Get GPI status" {
        command { gpi_number: u8 }
        reply { gpi_level: u8 }
    }

    // ----- Automatic mode -----

    SetRelayAutoControlParams / SetRelayAutoControlParamsReply = 0x09, "Set relay automatic control parameters" {
        command {
            relay_number: u8,
            /// 0 = no automatic control, 1 = on tag read, 2 = on alarm.
            relay_purpose: u8,
            /// Seconds the relay stays closed.
            pickup_time: u8,
        }
        reply {}
    }

    GetRelayAutoControlParams / GetRelayAutoControlParamsReply = 0x0A, "Get relay automatic control parameters" {
        command { relay_number: u8 }
        reply { relay_purpose: u8, pickup_time: u8 }
    }

    SetAutoPollingAntenna / SetAutoPollingAntennaReply = 0x15, "Set automatic polling antenna" {
        command { antennas: Vec<u8> }
        reply {}
    }

    GetAutoPollingAntenna / GetAutoPollingAntennaReply = 0x16, "Get automatic polling antenna" {
        command {}
        reply { antennas: Vec<u8> }
    }

    SetAutoReadTagType / SetAutoReadTagTypeReply = 0x21, "Set the automatic reading tag type" {
        command {
            /// Bit set of ISO18000-6B, ISO18000-6C and temperature tags.
            tag_type_bitmap: u8,
        }
        reply {}
    }

    GetAutoReadTagType / GetAutoReadTagTypeReply = 0x22, "Get the automatically read tag type" {
        command {}
        reply { tag_type_bitmap: u8 }
    }

    SetReportedHardwareInterface / SetReportedHardwareInterfaceReply = 0x29, "Set the reported hardware interface" {
        command { interface_number: u8, enable_reporting: u8 }
        reply {}
    }

    GetReportedHardwareInterface / GetReportedHardwareInterfaceReply = 0x2A, "Gets the reported hardware interface" {
        command { interface_number: u8 }
        reply { enable_reporting: u8 }
    }

    SetAutoReportingFields / SetAutoReportingFieldsReply = 0x2B, "Set automatic reporting fields" {
        command {
            field_bitmap: u32,
            tid_start_address: u8,
            tid_length: u8,
            user_start_address: u8,
            user_length: u8,
        }
        reply {}
    }

    GetAutoReportingFields / GetAutoReportingFieldsReply = 0x2C, "Get the automatically reported fields" {
        command {}
        reply {
            field_bitmap: u32,
            tid_start_address: u8,
            tid_length: u8,
            user_start_address: u8,
            user_length: u8,
        }
    }

    /// Fills one of the custom fields attached to automatic reports.
    SetAutoReportingContent / SetAutoReportingContentReply = 0x1A, "Set up automatic reporting content" {
        command {
            /// Custom field number, 0 to 5.
            custom_field_number: u8,
            /// ASCII content, zero padded.
            custom_content: [u8; 24],
        }
        reply {}
    }

    GetAutoReportingContent / GetAutoReportingContentReply = 0x44, "Get automatically reported content" {
        command { custom_field_number: u8 }
        reply { custom_content: [u8; 24] }
    }

    SetAutoReportingConditions / SetAutoReportingConditionsReply = 0x37, "Set automatic reporting conditions" {
        command { reporting_mode: u8, reporting_interval: u8 }
        reply {}
    }

    GetAutoReportingConditions / GetAutoReportingConditionsReply = 0x38, "Get automatic reporting conditions" {
        command {}
        reply { reporting_mode: u8, reporting_interval: u8 }
    }

    SetWiegandParams / SetWiegandParamsReply = 0x2D, "Set Wiegand parameters" {
        command {
            /// Units of 10 µs.
            pulse_width: u8,
            /// Units of 10 µs.
            pulse_interval: u8,
        }
        reply {}
    }

    GetWiegandParams / GetWiegandParamsReply = 0x2E, "Get Wiegand parameters" {
        command {}
        reply { pulse_width: u8, pulse_interval: u8 }
    }

    SetTriggerConditions / SetTriggerConditionsReply = 0x2F, "Set trigger conditions" {
        command { trigger_number: u8, trigger_level: u8, trigger_duration: u8 }
        reply {}
    }

    GetTriggerConditions / GetTriggerConditionsReply = 0x30, "Get trigger conditions" {
        command { trigger_number: u8 }
        reply { trigger_level: u8, trigger_duration: u8 }
    }

    // ----- High frequency -----

    Read15693Tag / Read15693TagReply = 0x71, "Read 15693 tags (4 bytes)" {
        command { uid: ShortBytes, start_block: u8, num_blocks: u8 }
        reply { tag_data: Vec<u8> }
    }

    Write15693Tag / Write15693TagReply = 0x72, "Write 15693 tags (4 bytes)" {
        command { uid: ShortBytes, write_block: u8, write_data: [u8; 4] }
        reply {}
    }

    Read14443aTag / Read14443aTagReply = 0x73, "Read 14443A label" {
        command { uid: ShortBytes, start_block: u8, num_blocks: u8 }
        reply { tag_data: Vec<u8> }
    }

    Write14443aTag / Write14443aTagReply = 0x74, "Write 14443A label" {
        command { uid: ShortBytes, write_block: u8, write_data: [u8; 4] }
        reply {}
    }

    Select14443aSector / Select14443aSectorReply = 0x75, "Select 14443A label sector" {
        command { uid: ShortBytes, sector_number: u8 }
        reply {}
    }

    Write15693MultipleBlocks / Write15693MultipleBlocksReply = 0x76, "Write 15693 label multiple blocks (4 bytes)" {
        command {
            uid: ShortBytes,
            start_block: u8,
            num_blocks: u8,
            /// `num_blocks * 4` bytes.
            write_data: Vec<u8>,
        }
        reply {}
    }

    Write14443aMultipleBlocks / Write14443aMultipleBlocksReply = 0x77, "Write multiple blocks of 14443A tags" {
        command { uid: ShortBytes, start_block: u8, num_blocks: u8, write_data: Vec<u8> }
        reply {}
    }

    ReadIso15693Tag / ReadIso15693TagReply = 0x78, "Read ISO15693 RFID tag" {
        command { uid: ShortBytes, start_block: u8, num_blocks: u8, block_size: u8 }
        reply { tag_data: Vec<u8> }
    }

    WriteIso15693Tag / WriteIso15693TagReply = 0x79, "Write ISO15693 Protocol RFID tag data block" {
        command {
            uid: ShortBytes,
            start_block: u8,
            num_blocks: u8,
            block_size: u8,
            /// `num_blocks * block_size` bytes.
            write_data: Vec<u8>,
        }
        reply {}
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl SetBaudRate {
    /// Baud rate for a `baud_rate_code`, or `None` for codes the device
    /// does not define.
    pub const fn baud_rate(code: u8) -> Option<u32> {
        match code {
            0 => Some(9_600),
            1 => Some(19_200),
            2 => Some(38_400),
            3 => Some(57_600),
            4 => Some(115_200),
            _ => None,
        }
    }
}

impl SetAutoReportingContent {
    /// Builds the command from text, truncating to 24 bytes.
    pub fn with_text(custom_field_number: u8, text: &str) -> Self {
        let mut custom_content = [0u8; 24];
        let bytes = text.as_bytes();
        let len = bytes.len().min(custom_content.len());
        custom_content[..len].copy_from_slice(&bytes[..len]);
        Self {
            custom_field_number,
            custom_content,
        }
    }
}

impl GetAutoReportingContentReply {
    /// The content up to the first NUL byte.
    pub fn text(&self) -> String {
        let end = self
            .custom_content
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.custom_content.len());
        String::from_utf8_lossy(&self.custom_content[..end]).into_owned()
    }
}
