//! 内容提取服务 - 业务能力层
//!
//! 只负责"把文件字节变成纯文本"，不关心文件从哪里来
//!
//! ## 支持的类型
//! - `docx`：解压后读取 `word/document.xml`，按段落拼接
//! - `pdf`：使用 `pdf-extract`
//! - `txt`：UTF-8 解码（可选去除图片链接）
//! - `md`：UTF-8 解码并去除 Markdown 图片与 base64 内嵌图片

use std::io::{Cursor, Read};
use std::sync::OnceLock;

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, error};

use crate::error::ExtractError;
use crate::models::DocumentKind;

/// 内容提取服务
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    strip_txt_image_links: bool,
}

impl ContentExtractor {
    pub fn new(strip_txt_image_links: bool) -> Self {
        Self {
            strip_txt_image_links,
        }
    }

    /// 按文件名推断类型并提取
    pub fn extract_named(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
        let kind = DocumentKind::from_file_name(file_name).map_err(|e| {
            error!("不支持的文件类型: {}", file_name);
            e
        })?;
        self.extract(bytes, kind)
    }

    /// 提取文本
    pub fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
        let result = match kind {
            DocumentKind::Docx => read_docx(bytes),
            DocumentKind::Pdf => read_pdf(bytes),
            DocumentKind::Txt => {
                let text = decode_utf8(bytes, "txt")?;
                if self.strip_txt_image_links {
                    Ok(strip_url_images(&strip_markdown_images(&text)))
                } else {
                    Ok(text)
                }
            }
            DocumentKind::Md => decode_utf8(bytes, "md").map(|text| strip_markdown_images(&text)),
        };

        match &result {
            Ok(text) => debug!("已读取 {} 文件，{} 个字符", kind, text.chars().count()),
            Err(e) => error!("读取 {} 文件失败: {}", kind, e),
        }

        result
    }
}

fn decode_utf8(bytes: &[u8], kind: &'static str) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|source| ExtractError::InvalidUtf8 { kind, source })
}

fn read_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf {
        message: e.to_string(),
    })
}

/// 读取 DOCX 正文，每个 `<w:p>` 一行
fn read_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(ExtractError::docx)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(ExtractError::docx)?
        .read_to_string(&mut xml)
        .map_err(ExtractError::docx)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(ExtractError::docx)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().map_err(ExtractError::docx)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

fn markdown_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("invalid markdown image regex"))
}

fn base64_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[.*?\]:\s*<data:image/.*?;base64,.*?>").expect("invalid base64 image regex")
    })
}

fn url_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://\S+?\.(?:png|jpe?g|gif|webp|svg|bmp)(?:\?\S*)?")
            .expect("invalid image url regex")
    })
}

/// 去除 `![alt](url)` 和 `[id]: <data:image/...;base64,...>`
pub fn strip_markdown_images(text: &str) -> String {
    let text = markdown_image_re().replace_all(text, "");
    base64_image_re().replace_all(&text, "").into_owned()
}

/// 去除看起来像图片的 URL
pub fn strip_url_images(text: &str) -> String {
    url_image_re().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_md_strips_images() {
        let md = "# Build log\n![diagram](https://x.io/a.png)Day 1 done.\n[logo]: <data:image/png;base64,iVBORw0KGgo=>\nEnd";
        let text = ContentExtractor::default()
            .extract(md.as_bytes(), DocumentKind::Md)
            .unwrap();
        assert_eq!(text, "# Build log\nDay 1 done.\n\nEnd");
    }

    #[test]
    fn test_txt_keeps_links_by_default() {
        let txt = "see https://x.io/shot.png here";
        let plain = ContentExtractor::default()
            .extract(txt.as_bytes(), DocumentKind::Txt)
            .unwrap();
        assert_eq!(plain, txt);

        let stripped = ContentExtractor::new(true)
            .extract(txt.as_bytes(), DocumentKind::Txt)
            .unwrap();
        assert_eq!(stripped, "see  here");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = ContentExtractor::default()
            .extract(&[0xff, 0xfe, 0x00], DocumentKind::Txt)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUtf8 { kind: "txt", .. }));
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = ContentExtractor::default()
            .extract(&build_docx(xml), DocumentKind::Docx)
            .unwrap();
        assert_eq!(text, "Hello world\n\nA\tB & C");
    }

    #[test]
    fn test_docx_includes_table_cells() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Intro</w:t></w:r></w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
    <w:p><w:r><w:t>Outro</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = ContentExtractor::default()
            .extract(&build_docx(xml), DocumentKind::Docx)
            .unwrap();
        assert_eq!(text, "Intro\nCell\nOutro");
    }

    #[test]
    fn test_broken_docx() {
        let err = ContentExtractor::default()
            .extract(b"not a zip", DocumentKind::Docx)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Docx { .. }));
    }

    #[test]
    fn test_broken_pdf() {
        let err = ContentExtractor::default()
            .extract(b"definitely not a pdf", DocumentKind::Pdf)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf { .. }));
    }

    #[test]
    fn test_extract_named_rejects_unknown_type() {
        let err = ContentExtractor::default()
            .extract_named("slides.pptx", b"whatever")
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFileType { .. }));
    }
}
