//! Crawl frontier bookkeeping
//!
//! The frontier owns all mutable state of one crawl: the visited set, the
//! FIFO queue of URLs waiting to be fetched, the number of URLs currently in
//! flight, and the completed pages. Every URL handed to it must already be
//! normalized.
//!
//! Budget rule: a URL may only be dequeued while
//! `results + in_flight < max_pages`, so concurrent workers can never
//! overshoot the page ceiling.

use crate::crawler::types::{CrawlProgress, CrawledPage};
use std::collections::{HashSet, VecDeque};

/// Outcome of asking the frontier for work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeue {
    /// A URL to process; the in-flight count has been incremented
    Ready(String),

    /// Nothing queued right now, but pages in flight may discover more
    Wait,

    /// The page budget is used up, or the queue is empty with nothing in flight
    Exhausted,
}

/// Visited set, queue, in-flight counter and results of one crawl
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    queue: VecDeque<String>,
    active: usize,
    results: Vec<CrawledPage>,
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given page ceiling
    pub fn new(max_pages: usize) -> Self {
        Self {
            visited: HashSet::new(),
            queue: VecDeque::new(),
            active: 0,
            results: Vec::new(),
            max_pages,
        }
    }

    /// Marks a URL visited and appends it to the queue
    ///
    /// Returns false (and changes nothing) if the URL was already visited.
    /// This is the only way a URL enters the queue, so each distinct URL is
    /// enqueued at most once.
    pub fn offer(&mut self, url: String) -> bool {
        if self.visited.contains(&url) {
            return false;
        }

        self.visited.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Returns true if the URL has already been seen in this crawl
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Takes the next URL off the queue if the budget allows it
    pub fn dequeue(&mut self) -> Dequeue {
        if self.results.len() + self.active >= self.max_pages {
            return Dequeue::Exhausted;
        }

        match self.queue.pop_front() {
            Some(url) => {
                self.active += 1;
                Dequeue::Ready(url)
            }
            None if self.active > 0 => Dequeue::Wait,
            None => Dequeue::Exhausted,
        }
    }

    /// Records a finished page and releases its in-flight slot
    pub fn complete(&mut self, page: CrawledPage) {
        self.results.push(page);
        self.release();
    }

    /// Releases an in-flight slot without recording a page
    pub fn release(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// Builds a progress snapshot for the URL about to be fetched
    pub fn progress(&self, current_url: &str) -> CrawlProgress {
        CrawlProgress {
            crawled: self.results.len(),
            total: self.results.len() + self.queue.len() + self.active,
            current_url: current_url.to_string(),
            discovered: self.visited.len(),
        }
    }

    /// Returns true once the page ceiling has been reached
    pub fn is_budget_exhausted(&self) -> bool {
        self.results.len() >= self.max_pages
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn completed(&self) -> usize {
        self.results.len()
    }

    /// Consumes the frontier, returning pages in completion order
    pub fn into_results(self) -> Vec<CrawledPage> {
        self.results
    }
}
