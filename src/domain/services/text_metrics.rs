// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::page::KeywordDensity;
use std::collections::HashMap;

/// 关键词统计忽略的常见停用词
const STOP_WORDS: [&str; 99] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
    "over", "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
    "should", "now", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "get", "got", "make", "made", "go", "went", "come", "came", "see", "saw",
    "know", "knew", "take", "took", "think", "thought", "this", "that", "these", "those", "you",
    "your", "our", "its", "it",
];

/// 保留的关键词数量上限
const TOP_KEYWORDS: usize = 20;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 估算单词音节数：元音连续段计一个音节，词尾不发音的 e 扣除，至少为 1
pub fn syllables(word: &str) -> u32 {
    let word = word
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '"'))
        .to_lowercase();

    let mut count = 0u32;
    let mut previous_was_vowel = false;
    for c in word.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = vowel;
    }

    if word.ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Flesch 易读性分数
///
/// 句子数为连续 `.!?` 段的个数。没有句子或没有单词时返回 0，
/// 结果截断到 [0, 100] 并保留两位小数。
///
/// # 参数
///
/// * `words` - 按空白切分的可见文本单词
pub fn readability_score(words: &[&str]) -> f64 {
    let mut sentences = 0u32;
    let mut in_terminator = false;
    for c in words.iter().flat_map(|w| w.chars().chain(std::iter::once(' '))) {
        let terminator = matches!(c, '.' | '!' | '?');
        if terminator && !in_terminator {
            sentences += 1;
        }
        in_terminator = terminator;
    }

    if sentences == 0 || words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let syllable_count: u32 = words.iter().map(|w| syllables(w)).sum();
    let score = 206.835
        - 1.015 * (word_count / f64::from(sentences))
        - 84.6 * (f64::from(syllable_count) / word_count);
    round2(score.clamp(0.0, 100.0))
}

/// 关键词密度
///
/// 单词为连续的字母数字或下划线，统一小写。去掉停用词和不超过两个字符的词后，
/// 取出现次数最多的前 20 个，只保留出现超过一次的词。
/// 密度为出现次数占全部单词（含停用词）的百分比。
///
/// # 返回值
///
/// 按出现次数降序；次数相同时按首次出现顺序
pub fn keyword_density(words: &[&str]) -> Vec<KeywordDensity> {
    let tokens: Vec<String> = words
        .iter()
        .flat_map(|w| w.split(|c: char| !(c.is_alphanumeric() || c == '_')))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    // keyword -> (count, first position)
    let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        if token.chars().count() <= 2 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        counts.entry(token.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, u32, usize)> = counts
        .into_iter()
        .map(|(keyword, (count, first))| (keyword, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let total = tokens.len() as f64;
    ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .filter(|(_, count, _)| *count > 1)
        .map(|(keyword, count, _)| KeywordDensity {
            keyword: keyword.to_string(),
            count,
            density: round2(f64::from(count) * 100.0 / total),
        })
        .collect()
}
