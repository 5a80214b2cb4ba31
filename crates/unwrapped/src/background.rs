//! Backdrop rotation: a random image from the fixed pool, swapped on a
//! timer. Bytes are fetched through the cache engine so a previously seen
//! backdrop still appears offline.

use std::time::Instant;

use crate::config::{BACKGROUND_IMAGES, BACKGROUND_SHUFFLE_INTERVAL};

#[derive(Debug)]
pub struct Background {
    current_url: &'static str,
    next_swap: Option<Instant>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            current_url: BACKGROUND_IMAGES[0],
            next_swap: None,
        }
    }
}

impl Background {
    pub fn current_url(&self) -> &'static str {
        self.current_url
    }

    /// Pick a random backdrop and arm the next swap. Returns the URL that
    /// should now be (re)fetched.
    pub fn shuffle(&mut self, now: Instant) -> &'static str {
        let pick = rand::random_range(0..BACKGROUND_IMAGES.len());
        self.current_url = BACKGROUND_IMAGES[pick];
        self.next_swap = Some(now + BACKGROUND_SHUFFLE_INTERVAL);
        log::debug!("background changed");
        self.current_url
    }

    /// Returns the URL to fetch when the shuffle interval has elapsed (or
    /// on the very first tick).
    pub fn tick(&mut self, now: Instant) -> Option<&'static str> {
        match self.next_swap {
            None => Some(self.shuffle(now)),
            Some(at) if now >= at => Some(self.shuffle(now)),
            Some(_) => None,
        }
    }
}
