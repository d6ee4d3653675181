/// Writes an ASCII section marker into the stream when the `debug_format` feature is on.
#[macro_export]
macro_rules! debug_write {
    ($msg:literal, $writer:expr) => {
        #[cfg(feature = "debug_format")]
        {
            for byte in $msg.as_bytes() {
                $writer.write_u8(*byte);
            }
        }
    };
}

/// Checks the section marker written by `debug_write!`.
#[macro_export]
macro_rules! debug_expect {
    ($msg:literal, $reader:expr) => {
        #[cfg(feature = "debug_format")]
        {
            for byte in $msg.as_bytes() {
                let read = $reader.read_u8().ok();
                assert!(
                    read == Some(*byte),
                    "Expected {:?}, but did not match.",
                    $msg
                );
            }
        }
    };
}
