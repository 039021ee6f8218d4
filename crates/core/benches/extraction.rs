use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use folio_core::{
    DomTree, ExtractConfig, PreprocessConfig, Readability, ReadabilityConfig, ScoreConfig, extract_content,
    parse, prepare_tree, preprocess_html, score_tree,
};

/// A page with `sections` article sections plus the usual chrome around them.
fn page(sections: usize) -> String {
    let mut html = String::from(
        "<html><head><title>Bench</title></head><body><nav class=\"menu\"><a href=\"/\">Home</a> <a href=\"/about\">About</a></nav><article>",
    );
    for i in 0..sections {
        html.push_str(&format!(
            "<section><h2>Section {i}</h2><p>Paragraph text for section {i}, with commas, clauses, and enough words to score.</p>\
             <div class=\"share\">Share <a href=\"/s/{i}\">Read more</a></div>\
             <table><tr><th>Key</th><th>Value</th></tr><tr><td>a</td><td>{i}</td></tr></table></section>"
        ));
    }
    html.push_str("</article><footer>Copyright <a href=\"/legal\">Legal</a></footer></body></html>");
    html
}

fn bench_full_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (label, sections) in [("small", 10), ("medium", 100), ("large", 1000)] {
        let html = page(sections);
        group.bench_with_input(BenchmarkId::new(label, html.len()), &html, |b, html| {
            b.iter(|| parse(black_box(html)))
        });
    }

    group.finish();
}

fn bench_preserving_links(c: &mut Criterion) {
    let html = page(100);
    let reader = Readability::with_config(
        ReadabilityConfig::builder()
            .preserve_important_links(true)
            .add_content_digests(true)
            .add_node_indexes(true)
            .build(),
    );

    c.bench_function("parse_annotated", |b| b.iter(|| reader.parse(black_box(&html))));
}

fn bench_preprocess(c: &mut Criterion) {
    let html = page(100);
    let config = PreprocessConfig::default();

    c.bench_function("preprocess", |b| b.iter(|| preprocess_html(black_box(&html), &config)));
}

fn bench_scoring(c: &mut Criterion) {
    let html = page(100);
    let preprocess = PreprocessConfig::default();
    let cleaned = preprocess_html(&html, &preprocess);
    let score_config = ScoreConfig::default();
    let extract_config = ExtractConfig::default();

    c.bench_function("scoring_and_selection", |b| {
        b.iter(|| {
            let mut tree = DomTree::parse(black_box(&cleaned));
            prepare_tree(&mut tree, &preprocess);
            let root = tree.root();
            score_tree(&mut tree, root, &score_config);
            extract_content(&mut tree, &extract_config)
        })
    });
}

criterion_group!(
    benches,
    bench_full_extraction,
    bench_preserving_links,
    bench_preprocess,
    bench_scoring
);
criterion_main!(benches);
