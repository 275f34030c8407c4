use crate::error::{ReaderError, WriterError};
use nsgate_wire::ByteCursor;

/// Compression pointers may chain at most this deep. Messages are untrusted;
/// a crafted packet can point labels at each other in a cycle.
pub const MAX_JUMPS: usize = 4;

/// Longest wire form of a name, per RFC 1035.
pub const MAX_NAME_LEN: usize = 255;

/// Reads a possibly compressed domain name at the cursor's reader index and
/// leaves the index just past the name's in-place bytes.
///
/// Labels are length-prefixed; a length byte with the top two bits set is a
/// 14 bit pointer to another position in the same message.
pub fn read_name(cursor: &mut ByteCursor) -> Result<String, ReaderError> {
    // Track the position locally: after the first jump the shared reader
    // index stays right behind the pointer while we walk the target.
    let mut position = cursor.reader();
    let mut jumped = false;
    let mut jumps = 0;
    let mut name = String::new();
    let mut delim = "";

    loop {
        let length = cursor.get_u8(position)?;
        if length & 0xC0 == 0xC0 {
            if jumps >= MAX_JUMPS {
                return Err(ReaderError::TooManyJumps(MAX_JUMPS));
            }
            if !jumped {
                cursor.set_reader(position + 2)?;
            }
            let low = cursor.get_u8(position + 1)? as usize;
            position = (((length as usize) ^ 0xC0) << 8) | low;
            jumped = true;
            jumps += 1;
        } else {
            position += 1;
            if length == 0 {
                break;
            }
            name.push_str(delim);
            let raw = cursor.get_bytes(position, length as usize)?;
            name.push_str(&String::from_utf8_lossy(raw).to_lowercase());
            delim = ".";
            position += length as usize;
        }
    }

    if !jumped {
        cursor.set_reader(position)?;
    }
    Ok(name)
}

/// Writes a name as uncompressed length-prefixed labels plus the zero
/// terminator. Compressed input is always accepted by [`read_name`]; nothing
/// requires emitting pointers on the way out.
pub fn write_name(cursor: &mut ByteCursor, name: &str) -> Result<(), WriterError> {
    if name.len() + 2 > MAX_NAME_LEN {
        return Err(WriterError::NameLength);
    }
    for label in name.split('.') {
        if label.len() > 0x3F {
            return Err(WriterError::SingleLabelLength);
        }
        cursor.write_u8(label.len() as u8)?;
        cursor.write_bytes(label.as_bytes())?;
    }
    cursor.write_u8(0)?;
    Ok(())
}
