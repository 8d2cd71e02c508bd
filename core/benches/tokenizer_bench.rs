use criterion::{criterion_group, criterion_main, Criterion};
use termspace_core::ngram::expand;
use termspace_core::tokenizer::tokenize;

fn bench_tokenize(c: &mut Criterion) {
    let text = "The medication caused a headache and nausea, but no dizziness was reported. "
        .repeat(200);
    c.bench_function("tokenize_medical", |b| b.iter(|| tokenize(&text)));
    let tokens = tokenize(&text);
    c.bench_function("expand_ngrams", |b| b.iter(|| expand(&tokens)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
