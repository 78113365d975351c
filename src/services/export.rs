//! Bundles per-aluno PDFs into one ZIP archive for bulk download.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Produces a ZIP with one entry per `(name, bytes)` pair, in the order
/// given. Entries are deflated; PDFs still shrink a little.
pub(crate) fn build_pdf_archive(
    entries: &[(String, Vec<u8>)],
) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn archive_keeps_entry_names_and_contents() {
        let entries = vec![
            ("prova_111.pdf".to_string(), b"%PDF-1.5 um".to_vec()),
            ("prova_222.pdf".to_string(), b"%PDF-1.5 dois".to_vec()),
        ];
        let bytes = build_pdf_archive(&entries).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = Vec::new();
        archive.by_name("prova_222.pdf").unwrap().read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"%PDF-1.5 dois");
    }

    #[test]
    fn empty_input_builds_an_empty_archive() {
        let bytes = build_pdf_archive(&[]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
