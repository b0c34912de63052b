use criterion::{criterion_group, criterion_main, Criterion};
use postsearch_core::tokenizer::{clean, tokenize};
use postsearch_core::Normalizer;

const POST: &str = "Вчера вечером мы гуляли по набережной, смотрели на реку и обсуждали планы на лето. \
В 2023 году город открыл 12 новых парков, и теперь гулять стало приятнее! \
Кошки спали на скамейках, собаки бегали за голубями, а дети запускали воздушных змеев.";

fn bench_tokenize(c: &mut Criterion) {
    let text = POST.repeat(50);
    let normalizer = Normalizer::from_dictionary(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/ru_morph_sample.tsv"))
        .expect("sample dictionary");
    c.bench_function("clean_post", |b| b.iter(|| clean(&text)));
    c.bench_function("tokenize_post", |b| b.iter(|| tokenize(&text, &normalizer)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
