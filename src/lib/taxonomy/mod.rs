//! Tag and archive views over the visible, newest-first post listing.

use std::collections::BTreeMap;

use itertools::Itertools;
use time::Month;

use crate::{post::BlogPost, types::Tag};

/// Every tag in use with its post count, ordered by slug.
pub fn unique_tags(posts: &[BlogPost]) -> Vec<(Tag, usize)> {
    let mut counts: BTreeMap<Tag, usize> = BTreeMap::new();
    for t in posts.iter().flat_map(|p| &p.tags) {
        *counts.entry(t.clone()).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Posts carrying `tag`, keeping the listing order.
pub fn posts_by_tag(posts: &[BlogPost], tag: &Tag) -> Vec<BlogPost> {
    posts
        .iter()
        .filter(|p| p.tags.contains(tag))
        .cloned()
        .collect()
}

#[derive(Debug)]
pub struct YearGroup<'a> {
    pub year: i32,
    pub months: Vec<MonthGroup<'a>>,
}

#[derive(Debug)]
pub struct MonthGroup<'a> {
    pub month: Month,
    pub posts: Vec<&'a BlogPost>,
}

/// Group a newest-first listing by year, then by month.
pub fn archive(posts: &[BlogPost]) -> Vec<YearGroup<'_>> {
    posts
        .iter()
        .chunk_by(|p| p.pub_datetime.year())
        .into_iter()
        .map(|(year, in_year)| {
            let months = in_year
                .chunk_by(|p| p.pub_datetime.month())
                .into_iter()
                .map(|(month, in_month)| MonthGroup {
                    month,
                    posts: in_month.collect(),
                })
                .collect();
            YearGroup { year, months }
        })
        .collect()
}
