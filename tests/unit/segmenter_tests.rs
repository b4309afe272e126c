/*!
 * Property-style tests for the segmenter on realistic chapter text
 */

use chaptrans::segmenter::Segmenter;

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn sample_chapter(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|p| {
            format!(
                "Paragraph {} opens with a steady line. It continues with a second sentence! \
                 Does a question fit here? \"Certainly.\" The narration closes the paragraph.",
                p + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Every segment stays within 1.5x the soft size across a range of sizes.
#[test]
fn test_segment_boundedness_acrossSizes() {
    let text = sample_chapter(12);

    for size in [40, 80, 150, 300, 600] {
        for segment in Segmenter::segment(&text, Some(size)) {
            assert!(
                segment.len() <= size + size / 2,
                "size {}: segment of {} bytes exceeds the 1.5x bound",
                size,
                segment.len()
            );
        }
    }
}

/// No content is lost or reordered, whatever the segment size.
#[test]
fn test_segment_coverage_acrossSizes() {
    let text = sample_chapter(8);

    for size in [50, 120, 250, 1000] {
        let segments = Segmenter::segment(&text, Some(size));
        let rejoined = segments.join(" ");
        assert_eq!(
            strip_whitespace(&rejoined),
            strip_whitespace(&text),
            "content mismatch at size {}",
            size
        );
    }
}

/// Paragraph-heavy text cuts at blank lines, so segments start at
/// paragraph openings.
#[test]
fn test_segment_paragraphText_shouldStartSegmentsAtParagraphs() {
    let text = sample_chapter(6);
    let segments = Segmenter::segment(&text, Some(170));

    assert!(segments.len() > 1);
    for segment in &segments[1..] {
        assert!(
            segment.starts_with("Paragraph") || segment.starts_with('"') || segment.starts_with("It")
                || segment.starts_with("Does") || segment.starts_with("The"),
            "segment starts mid-word: {:?}",
            &segment[..segment.len().min(40)]
        );
    }
}

/// Multibyte text never splits inside a character.
#[test]
fn test_segment_multibyte_shouldStayOnCharBoundaries() {
    let text = "昔々、ある所に小さな村がありました。 村の外れに古い井戸があります。 \
                誰もその井戸に近づきませんでした。"
        .repeat(20);

    // Sizes chosen to land mid-character if byte offsets were used naively.
    for size in [31, 47, 101] {
        let segments = Segmenter::segment(&text, Some(size));
        let rejoined = segments.join("");
        assert_eq!(strip_whitespace(&rejoined), strip_whitespace(&text));
    }
}
