use crate::{model::ColumnRawValue, value::NULL_MARKER};

/// Splits one COPY text line (without the trailing newline) into raw values.
pub fn decode_copy_row(line: &[u8]) -> Vec<ColumnRawValue> {
    line.split(|byte| *byte == b'\t')
        .map(|field| {
            if field == NULL_MARKER.as_bytes() {
                ColumnRawValue::null()
            } else {
                ColumnRawValue::new(unescape(field))
            }
        })
        .collect()
}

/// Renders raw values as one COPY text line, without the trailing newline.
pub fn encode_copy_row(values: &[ColumnRawValue]) -> Vec<u8> {
    let mut line = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            line.push(b'\t');
        }
        if value.is_null {
            line.extend_from_slice(NULL_MARKER.as_bytes());
        } else {
            escape_into(&value.data, &mut line);
        }
    }
    line
}

fn unescape(field: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(field.len());
    let mut bytes = field.iter();
    while let Some(byte) = bytes.next() {
        if *byte != b'\\' {
            output.push(*byte);
            continue;
        }
        match bytes.next() {
            Some(b't') => output.push(b'\t'),
            Some(b'n') => output.push(b'\n'),
            Some(b'r') => output.push(b'\r'),
            Some(b'b') => output.push(0x08),
            Some(b'f') => output.push(0x0c),
            Some(b'v') => output.push(0x0b),
            Some(other) => output.push(*other),
            None => output.push(b'\\'),
        }
    }
    output
}

fn escape_into(data: &[u8], output: &mut Vec<u8>) {
    for byte in data {
        match byte {
            b'\\' => output.extend_from_slice(b"\\\\"),
            b'\t' => output.extend_from_slice(b"\\t"),
            b'\n' => output.extend_from_slice(b"\\n"),
            b'\r' => output.extend_from_slice(b"\\r"),
            0x08 => output.extend_from_slice(b"\\b"),
            0x0c => output.extend_from_slice(b"\\f"),
            0x0b => output.extend_from_slice(b"\\v"),
            other => output.push(*other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_copy_row() {
        let row = decode_copy_row(b"1\t\\N\tline\\nbreak\ttab\\there\tback\\\\slash");
        assert_eq!(
            row,
            vec![
                ColumnRawValue::new("1"),
                ColumnRawValue::null(),
                ColumnRawValue::new("line\nbreak"),
                ColumnRawValue::new("tab\there"),
                ColumnRawValue::new("back\\slash"),
            ]
        );
    }

    #[test]
    fn test_encode_escapes_special_bytes() {
        let line = encode_copy_row(&[
            ColumnRawValue::new("a\tb"),
            ColumnRawValue::null(),
            ColumnRawValue::new("\\N"),
        ]);
        assert_eq!(line, b"a\\tb\t\\N\t\\\\N".to_vec());
    }

    #[test]
    fn test_literal_backslash_n_is_not_null() {
        let row = decode_copy_row(b"\\\\N");
        assert_eq!(row, vec![ColumnRawValue::new("\\N")]);
    }
}
