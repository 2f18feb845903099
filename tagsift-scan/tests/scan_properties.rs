use std::time::{Duration, Instant};

use tagsift_scan::{CollectSink, Halt, OwnedElement, TagSet, scan, scan_into};

fn default_targets() -> TagSet {
    TagSet::new(["h1", "h2", "h3", "p"])
}

fn extract(input: &str, targets: &TagSet) -> Vec<OwnedElement> {
    let mut sink = CollectSink::default();
    scan_into(input.as_bytes(), targets, &mut sink).unwrap();
    sink.elements
}

fn pairs(items: &[(&str, &str)]) -> Vec<OwnedElement> {
    items
        .iter()
        .map(|(n, c)| OwnedElement::new(*n, *c))
        .collect()
}

#[test]
fn input_without_angle_brackets_yields_nothing() {
    let targets = default_targets();
    for input in ["", "plain text", "h1 p /p > >> &lt;p&gt;", "\n\t  "] {
        assert!(extract(input, &targets).is_empty(), "input: {input:?}");
    }
}

#[test]
fn single_heading_is_found_amid_unrelated_markup() {
    let targets = default_targets();
    let inputs = [
        "<h1>X</h1>",
        "<!DOCTYPE html><html><head><title>t</title></head><body><h1>X</h1></body></html>",
        "<div class=\"a\"><span>s</span><h1>X</h1><img src=x/></div>",
        "</h2><!-- note --> <h1>X</h1>",
    ];
    for input in inputs {
        let found = extract(input, &targets);
        let headings: Vec<_> = found.iter().filter(|e| e.name == "h1").collect();
        assert_eq!(headings.len(), 1, "input: {input}");
        assert_eq!(headings[0].content, "X", "input: {input}");
    }
}

#[test]
fn matching_ignores_case_and_reports_source_case() {
    let found = extract("<H2>y</H2>", &TagSet::new(["h2"]));
    assert_eq!(found, pairs(&[("H2", "y")]));

    let found = extract("<h2>mixed</H2>", &TagSet::new(["H2"]));
    assert_eq!(found, pairs(&[("h2", "mixed")]));
}

#[test]
fn elements_come_out_in_document_order() {
    let input = "<p>one</p><h3>two</h3><h1>three</h1><p>four</p><h2>five</h2>";
    let found = extract(input, &default_targets());
    assert_eq!(
        found,
        pairs(&[
            ("p", "one"),
            ("h3", "two"),
            ("h1", "three"),
            ("p", "four"),
            ("h2", "five"),
        ])
    );
}

#[test]
fn unclosed_target_does_not_block_later_targets() {
    let input = "<h2>never closed <div>x</div><p>after</p><h1>last</h1>";
    let found = extract(input, &default_targets());
    assert_eq!(found, pairs(&[("p", "after"), ("h1", "last")]));
}

#[test]
fn close_tags_and_comments_never_produce_elements() {
    let targets = default_targets();
    assert!(extract("</p></h1></H2>", &targets).is_empty());
    assert!(extract("<!-- p --><!p></p><!DOCTYPE h1>", &targets).is_empty());
}

#[test]
fn scanning_twice_gives_identical_output() {
    let input = "<p>a</p><p>b<p>c</p>d</p><h1>e";
    let targets = default_targets();
    assert_eq!(extract(input, &targets), extract(input, &targets));
}

#[test]
fn inner_markup_is_kept_verbatim() {
    let input = "<html><h1>Title</h1><p>Body <b>bold</b> text</p></html>";
    let found = extract(input, &default_targets());
    assert_eq!(
        found,
        pairs(&[("h1", "Title"), ("p", "Body <b>bold</b> text")])
    );
}

#[test]
fn nested_same_name_closes_at_first_close_tag() {
    let found = extract("<p>outer<p>inner</p>more</p>", &TagSet::new(["p"]));
    assert_eq!(found, pairs(&[("p", "outer<p>inner")]));
}

#[test]
fn trailing_unclosed_heading_ends_cleanly() {
    let targets = default_targets();
    let mut scanner = scan(b"<h1>Unclosed", &targets);
    assert_eq!(scanner.next(), None);
    let summary = scanner.summary();
    assert_eq!(summary.emitted, 0);
    assert_eq!(summary.unclosed, 1);
    assert_eq!(summary.halted, None);
}

#[test]
fn unterminated_open_tag_halts_the_scan() {
    let targets = default_targets();
    let mut sink = CollectSink::default();
    let summary = scan_into(b"<p>first</p><p class=\"x", &targets, &mut sink).unwrap();
    assert_eq!(sink.elements, pairs(&[("p", "first")]));
    assert_eq!(
        summary.halted,
        Some(Halt::UnterminatedOpenTag { offset: 12 })
    );
}

#[test]
fn attributes_and_whitespace_after_names_are_tolerated() {
    let input = "<p class=\"lead\">a</p><h1\nid=x>b</h1><p/>c</p>";
    let found = extract(input, &default_targets());
    assert_eq!(found, pairs(&[("p", "a"), ("h1", "b"), ("p", "c")]));
}

#[test]
fn non_target_prefix_names_are_not_confused_with_targets() {
    let input = "<pre>code</pre><param>x</param><h10>y</h10><p>z</p>";
    let found = extract(input, &default_targets());
    assert_eq!(found, pairs(&[("p", "z")]));
}

#[test]
fn content_lies_between_its_own_tags() {
    let input = b"<body><h2 id=a>alpha</h2> junk <p>beta</p></body>";
    let targets = default_targets();
    for el in scan(input, &targets) {
        let start = el.offset();
        let content_start = el.content().as_ptr() as usize - input.as_ptr() as usize;
        let content_end = content_start + el.content().len();
        assert!(content_start > start);
        let close = &input[content_end..content_end + el.name().len() + 3];
        assert!(close.starts_with(b"</"));
        assert!(close[2..close.len() - 1].eq_ignore_ascii_case(el.name()));
    }
}

#[test]
fn many_unclosed_targets_scan_quickly() {
    let input = "<p>".repeat(50_000) + "<h1>end</h1>";
    let found = extract(&input, &default_targets());
    assert_eq!(found, pairs(&[("h1", "end")]));
}

// Both inputs take minutes if a start tag rescans the rest of the page.
#[test]
fn unterminated_names_scan_in_linear_time() {
    let input = "<a".repeat(500_000);
    let started = Instant::now();
    let targets = default_targets();
    let mut scanner = scan(input.as_bytes(), &targets);
    assert_eq!(scanner.by_ref().count(), 0);
    assert_eq!(scanner.summary().halted, None);
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
}

#[test]
fn distant_open_tag_end_scans_in_linear_time() {
    let input = "<p a".repeat(250_000) + ">";
    let started = Instant::now();
    let targets = default_targets();
    let mut scanner = scan(input.as_bytes(), &targets);
    assert_eq!(scanner.by_ref().count(), 0);
    assert_eq!(scanner.summary().unclosed, 250_000);
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
}

#[test]
fn comment_bodies_are_scanned_like_any_other_text() {
    // Only the `<!` marker is skipped, not everything up to `-->`.
    let found = extract("<!-- <p>hidden</p> --><p>shown</p>", &default_targets());
    assert_eq!(found, pairs(&[("p", "hidden"), ("p", "shown")]));
}
