use tempfile::TempDir;

use lumen::{Document, IndexConfig, IndexHandle, SearchHit, WriteMode};

fn setup_index() -> (TempDir, IndexHandle) {
    let tmp = TempDir::new().unwrap();
    let index = IndexHandle::open(tmp.path(), "golden", IndexConfig::default()).unwrap();
    (tmp, index)
}

fn create_doc(id: &str, content: &str) -> Document {
    Document::new(id, content).with_payload(format!("{{\"source\":\"{id}\"}}"))
}

fn ids(hits: &[SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.id.as_str()).collect()
}

fn strip_tags(s: &str) -> String {
    s.replace("<b>", "").replace("</b>", "")
}

#[test]
fn golden_fox_and_lazy_dog() {
    let (_tmp, index) = setup_index();
    index
        .write(
            &[
                create_doc("1", "the quick brown fox"),
                create_doc("2", "the lazy dog"),
            ],
            WriteMode::Append,
        )
        .unwrap();

    let hits = index.search("fox", 10).unwrap();
    assert_eq!(ids(&hits), vec!["1"]);
    assert!(hits[0].score > 0.0);

    let mut both = ids(&index.search("the", 10).unwrap())
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    both.sort();
    assert_eq!(both, vec!["1", "2"]);
}

#[test]
fn golden_round_trip_preserves_fields() {
    let (_tmp, index) = setup_index();
    let content = "Ünïcode content, with punctuation! And CASE.";
    index
        .write(&[Document::new("doc-1", content).with_payload("{\"k\":[1,2,3]}")], WriteMode::Append)
        .unwrap();

    let hits = index.search("punctuation", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "doc-1");
    assert_eq!(hits[0].content, content);
    assert_eq!(hits[0].payload, "{\"k\":[1,2,3]}");
    assert_eq!(hits[0].slot, 0);
}

#[test]
fn golden_higher_term_frequency_ranks_first() {
    let (_tmp, index) = setup_index();
    index
        .write(
            &[create_doc("low", "fox cat cat"), create_doc("high", "fox fox cat")],
            WriteMode::Append,
        )
        .unwrap();

    let hits = index.search("fox", 10).unwrap();
    assert_eq!(ids(&hits), vec!["high", "low"]);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn golden_shorter_document_ranks_first() {
    let (_tmp, index) = setup_index();
    index
        .write(
            &[
                create_doc("long", "rust and many other words that dilute the match"),
                create_doc("short", "rust language"),
            ],
            WriteMode::Append,
        )
        .unwrap();

    assert_eq!(ids(&index.search("rust", 10).unwrap()), vec!["short", "long"]);
}

#[test]
fn golden_equal_scores_keep_insertion_order() {
    let (_tmp, index) = setup_index();
    for id in ["a", "b", "c"] {
        index.write(&[create_doc(id, "same text")], WriteMode::Append).unwrap();
    }

    assert_eq!(ids(&index.search("same", 10).unwrap()), vec!["a", "b", "c"]);
}

#[test]
fn golden_recreate_replaces_everything() {
    let (_tmp, index) = setup_index();
    index
        .write(&[create_doc("old-1", "ancient scroll"), create_doc("old-2", "ancient map")], WriteMode::Append)
        .unwrap();
    index.write(&[create_doc("new-1", "modern scroll")], WriteMode::Recreate).unwrap();

    assert!(index.search("ancient", 10).unwrap().is_empty());
    let hits = index.search("scroll", 10).unwrap();
    assert_eq!(ids(&hits), vec!["new-1"]);
    assert_eq!(hits[0].slot, 0);
    assert_eq!(index.doc_count(), 1);
}

#[test]
fn golden_delete_removes_all_duplicates() {
    let (_tmp, index) = setup_index();
    index
        .write(&[create_doc("dup", "first copy"), create_doc("keep", "unrelated copy")], WriteMode::Append)
        .unwrap();
    index.write(&[create_doc("dup", "second copy")], WriteMode::Append).unwrap();

    assert_eq!(index.delete("dup").unwrap(), 2);
    assert_eq!(ids(&index.search("copy", 10).unwrap()), vec!["keep"]);
    assert!(index.search("first OR second", 10).unwrap().is_empty());
    assert!(index.search("id:dup", 10).unwrap().is_empty());
    assert_eq!(index.doc_count(), 1);
}

#[test]
fn golden_highlight_is_contained_in_content() {
    let (_tmp, index) = setup_index();
    let filler = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(6);
    let content = format!("{filler}The Quick brown FOX jumps. {filler}");
    index.write(&[create_doc("long", &content)], WriteMode::Append).unwrap();

    let hits = index.search("fox quick", 10).unwrap();
    assert_eq!(hits.len(), 1);
    let highlighted = &hits[0].highlighted_content;
    assert!(highlighted.contains("<b>FOX</b>"), "{highlighted}");
    assert!(highlighted.contains("<b>Quick</b>"), "{highlighted}");

    let plain = strip_tags(highlighted);
    assert!(content.contains(&plain));
    assert!(plain.chars().count() <= index.config().highlight.max_fragment_chars);
}

#[test]
fn golden_similarity_properties() {
    let pairs = [
        ("the quick brown fox", "the quick brown fox"),
        ("rust search engine", "a search engine written in rust"),
        ("alpha beta", "gamma delta"),
        ("", "anything"),
    ];
    for (a, b) in pairs {
        let ab = lumen::similarity(a, b);
        assert_eq!(ab, lumen::similarity(b, a), "{a} / {b}");
        assert!((0.0..=1.0).contains(&ab));
    }

    assert_eq!(lumen::similarity("the quick brown fox", "the quick brown fox"), 1.0);
    assert_eq!(lumen::similarity("alpha beta", "gamma delta"), 0.0);
    assert_eq!(lumen::similarity("", "anything"), 0.0);
    assert!(lumen::similarity("rust search engine", "a search engine written in rust") > 0.5);
}
