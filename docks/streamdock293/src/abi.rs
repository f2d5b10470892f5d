//! Command payloads for the StreamDock 293.
//!
//! Every control command is a short literal tag followed by its arguments.
//! The serializer frames them behind [`CMD_PREFIX`] and pads them out to a
//! full packet; bulk image data follows as raw, unprefixed chunks.

/// Tag sent in front of every control command ("CRT\0\0")
pub const CMD_PREFIX: [u8; 5] = [0x43, 0x52, 0x54, 0x00, 0x00];

/// Clear target addressing every key at once
pub const ALL_KEYS: u8 = 0xFF;

pub trait Arg {
    const SIZE: usize;
    fn to_bytes(&self) -> Vec<u8>;
}

impl Arg for u8 {
    const SIZE: usize = 1;
    fn to_bytes(&self) -> Vec<u8> {
        vec![*self]
    }
}

impl Arg for u32 {
    const SIZE: usize = 4;
    fn to_bytes(&self) -> Vec<u8> {
        self.to_be_bytes().to_vec()
    }
}

macro_rules! impl_command_abi {
    [$(
        $( #[doc = $( $doc:tt )* ] )*
        fn $name:ident ( [ $( $hardcode:expr ),* ] $( , $arg:ident: $type:ty )* );
    )+] => {
        $(
            $(#[doc = concat!("Construct a payload for ", $($doc)*)])*
            pub fn $name( $( $arg: $type ),* ) -> Vec<u8> {
                let mut buf: Vec<u8> =
                    Vec::with_capacity(0 $( + { let _ = $hardcode; 1 } )* $( + <$type as Arg>::SIZE )*);
                $( buf.push($hardcode); )*
                $( buf.extend_from_slice(&Arg::to_bytes(&$arg)); )*
                buf
            }
        )*
    };
}

impl_command_abi![
    /* DISPLAY */

    /// setting the backlight brightness
    fn set_brightness([0x4C, 0x49, 0x47, 0x00, 0x00], value: u8);

    /// clearing one key, or every key with [`ALL_KEYS`]
    fn clear_key([0x43, 0x4C, 0x45, 0x00, 0x00, 0x00], target: u8);

    /// waking the display from standby
    fn wake_screen([0x44, 0x49, 0x53, 0x00, 0x00]);

    /// committing uploaded images to the display
    fn commit([0x53, 0x54, 0x50, 0x00, 0x00]);

    /* MEDIA */

    /// announcing a key icon upload of `size` encoded bytes
    fn begin_icon([0x42, 0x41, 0x54], size: u32, key: u8);

    /// announcing a full-frame boot logo upload
    fn begin_boot_image([0x4C, 0x4F, 0x47, 0x00, 0x11, 0x94, 0x00, 0x01]);
];
