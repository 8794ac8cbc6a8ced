//! Splits message text on Markdown image syntax `![alt](<uri>)` so embedded
//! data URIs can become inline image parts while the rest of the text stays
//! a text part (§4.7).

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    ImageUri(String),
}

pub fn split_markdown_images(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;

    loop {
        let Some(bang_pos) = rest.find("![") else {
            segments.push(Segment::Text(rest.to_string()));
            break;
        };

        let Some(close_bracket) = rest[bang_pos..].find("](") else {
            segments.push(Segment::Text(rest.to_string()));
            break;
        };
        let paren_start = bang_pos + close_bracket + 2;

        let Some(close_paren_rel) = rest[paren_start..].find(')') else {
            segments.push(Segment::Text(rest.to_string()));
            break;
        };
        let close_paren = paren_start + close_paren_rel;

        if bang_pos > 0 {
            segments.push(Segment::Text(rest[..bang_pos].to_string()));
        }
        segments.push(Segment::ImageUri(rest[paren_start..close_paren].to_string()));
        rest = &rest[close_paren + 1..];
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_image_segments() {
        let segments = split_markdown_images("just text");
        assert_eq!(segments, vec![Segment::Text("just text".to_string())]);
    }

    #[test]
    fn image_syntax_extracts_uri() {
        let segments = split_markdown_images("before ![alt](data:image/png;base64,abc) after");
        assert_eq!(
            segments,
            vec![
                Segment::Text("before ".to_string()),
                Segment::ImageUri("data:image/png;base64,abc".to_string()),
                Segment::Text(" after".to_string()),
            ]
        );
    }

    #[test]
    fn multiple_images_are_all_extracted() {
        let segments = split_markdown_images("![a](uri1)![b](uri2)");
        let uris: Vec<_> = segments
            .into_iter()
            .filter_map(|s| match s {
                Segment::ImageUri(u) => Some(u),
                Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(uris, vec!["uri1".to_string(), "uri2".to_string()]);
    }
}
