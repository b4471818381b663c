use crate::files::validator::RawFile;
use crate::models::chat::{new_id, FileAttachment};

/// Turns a picked file into an attachment. Text-like files get their content
/// inlined; the raw bytes are always kept for upload.
pub fn read_to_attachment(file: RawFile) -> FileAttachment {
    let content = if is_text_like(&file) {
        // Undecodable text is treated like a failed read: no inline content.
        String::from_utf8(file.bytes.to_vec()).ok()
    } else {
        None
    };

    FileAttachment {
        id: new_id(),
        name: file.name,
        size: file.size,
        mime: file.mime,
        content,
        file: Some(file.bytes),
    }
}

fn is_text_like(file: &RawFile) -> bool {
    file.mime.starts_with("text/") || file.name.ends_with(".md") || file.name.ends_with(".txt")
}

/// Folds newly accepted attachments into the pending buffer.
///
/// Single-file policies replace the buffer; otherwise new files are appended
/// and the buffer is capped at `max_files`.
pub fn merge_pending(
    mut pending: Vec<FileAttachment>,
    accepted: Vec<FileAttachment>,
    max_files: usize,
) -> Vec<FileAttachment> {
    if max_files <= 1 {
        return accepted.into_iter().take(1).collect();
    }
    pending.extend(accepted);
    pending.truncate(max_files);
    pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn raw(name: &str, mime: &str, body: &'static [u8]) -> RawFile {
        RawFile {
            name: name.to_string(),
            size: body.len() as u64,
            mime: mime.to_string(),
            bytes: Bytes::from_static(body),
        }
    }

    #[test]
    fn test_text_file_content_is_inlined() {
        let att = read_to_attachment(raw("resume.md", "", b"# Jane Doe"));
        assert_eq!(att.content.as_deref(), Some("# Jane Doe"));
        assert_eq!(att.size, 10);
        assert!(att.file.is_some());
    }

    #[test]
    fn test_binary_file_keeps_only_bytes() {
        let att = read_to_attachment(raw("cv.pdf", "application/pdf", b"%PDF-1.4"));
        assert_eq!(att.content, None);
        assert_eq!(att.file.as_deref(), Some(&b"%PDF-1.4"[..]));
    }

    #[test]
    fn test_invalid_utf8_text_has_no_content() {
        let att = read_to_attachment(raw("notes.txt", "text/plain", &[0xff, 0xfe, 0x00]));
        assert_eq!(att.content, None);
    }

    #[test]
    fn test_single_file_policy_replaces_pending() {
        let old = read_to_attachment(raw("old.txt", "text/plain", b"a"));
        let new_a = read_to_attachment(raw("a.txt", "text/plain", b"a"));
        let new_b = read_to_attachment(raw("b.txt", "text/plain", b"b"));
        let merged = merge_pending(vec![old], vec![new_a, new_b], 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "a.txt");
    }

    #[test]
    fn test_multi_file_policy_appends_and_caps() {
        let pending = vec![read_to_attachment(raw("1.txt", "text/plain", b"1"))];
        let accepted = vec![
            read_to_attachment(raw("2.txt", "text/plain", b"2")),
            read_to_attachment(raw("3.txt", "text/plain", b"3")),
        ];
        let merged = merge_pending(pending, accepted, 2);
        let names: Vec<_> = merged.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["1.txt", "2.txt"]);
    }
}
