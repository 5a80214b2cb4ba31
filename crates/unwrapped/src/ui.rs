//! Panel drawing: top bar, search panel, playlist panel, backdrop and the
//! draggable player card.

use std::time::Instant;

use egui::{Color32, CornerRadius, Frame, Margin, RichText, Stroke};
use unwrapped_cache::NotificationAction;

use crate::app::UnwrappedApp;
use crate::player;
use crate::playlist::PlaylistEntry;

const PANEL_FILL: Color32 = Color32::from_rgb(16, 18, 24);
const CARD_BG: Color32 = Color32::from_rgb(24, 27, 36);
const CARD_BORDER: Color32 = Color32::from_rgb(45, 50, 62);
const ERROR_RED: Color32 = Color32::from_rgb(239, 68, 68);
const ACCENT_PLAY: Color32 = Color32::from_rgb(20, 120, 200);
const ACCENT_ADD: Color32 = Color32::from_rgb(0, 128, 0);
const VIEWPORT_MARGIN: f32 = 8.0;

impl UnwrappedApp {
    pub fn draw(&mut self, ctx: &egui::Context, now: Instant) {
        self.request_visible_thumbnails();
        self.draw_top_bar(ctx);
        if self.search.is_open() {
            self.draw_search_panel(ctx, now);
        }
        if self.playlist_open {
            self.draw_playlist_panel(ctx);
        }
        self.draw_central(ctx);
        self.draw_banners(ctx);
    }

    /// Queue cache fetches for every thumbnail the visible panels will
    /// want this frame.
    fn request_visible_thumbnails(&mut self) {
        let mut wanted: Vec<String> = Vec::new();
        for entry in self.playlist.entries() {
            wanted.push(thumbnail_url(entry));
        }
        for result in self.search.results() {
            if !result.thumbnail.is_empty() {
                wanted.push(result.thumbnail.clone());
            }
        }
        for url in wanted {
            self.request_image(&url);
        }
    }

    fn draw_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            Frame::default()
                .fill(PANEL_FILL)
                .inner_margin(Margin::symmetric(12, 8))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let clock = self.clock.display();
                        ui.label(
                            RichText::new(clock.text())
                                .monospace()
                                .size(18.0)
                                .color(Color32::from_rgb(229, 231, 235)),
                        );
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                let search_label = if self.search.is_open() {
                                    "🔍 Search ▲"
                                } else {
                                    "🔍 Search ▼"
                                };
                                if ui.button(search_label).clicked() {
                                    self.toggle_search();
                                }
                                if ui
                                    .selectable_label(self.playlist_open, "🎶 Playlist")
                                    .clicked()
                                {
                                    self.toggle_playlist();
                                }
                                let blur_label = if self.blur_enabled {
                                    "🔒 Blur ON"
                                } else {
                                    "🔓 Blur OFF"
                                };
                                if ui.button(blur_label).clicked() {
                                    let enabled = !self.blur_enabled;
                                    self.set_blur(enabled);
                                }
                            },
                        );
                    });
                });
        });
    }

    fn draw_search_panel(&mut self, ctx: &egui::Context, now: Instant) {
        let panel = egui::TopBottomPanel::top("search_panel")
            .resizable(false)
            .show(ctx, |ui| {
                Frame::default()
                    .fill(PANEL_FILL)
                    .inner_margin(Margin::symmetric(12, 10))
                    .show(ui, |ui| {
                        self.draw_search_controls(ui, now);
                        ui.add_space(6.0);
                        self.draw_search_results(ui);
                    });
            });
        let hovered = panel.response.contains_pointer();
        self.search.set_hovered(hovered, now);
    }

    fn draw_search_controls(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.search.query)
                    .hint_text("Search YouTube")
                    .desired_width(280.0),
            );
            if response.changed() {
                self.search.input_changed(now);
            }
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Search").clicked() || submitted {
                if let Some(dispatch) = self.search.submit() {
                    self.dispatch_search(dispatch);
                }
            }

            egui::ComboBox::from_id_salt("order_filter")
                .selected_text(
                    self.search_filters.order.as_deref().unwrap_or("relevance"),
                )
                .show_ui(ui, |ui| {
                    for (value, label) in [
                        (None, "relevance"),
                        (Some("date"), "date"),
                        (Some("viewCount"), "viewCount"),
                        (Some("rating"), "rating"),
                    ] {
                        if ui
                            .selectable_label(
                                self.search_filters.order.as_deref() == value,
                                label,
                            )
                            .clicked()
                        {
                            self.search_filters.order = value.map(str::to_owned);
                        }
                    }
                });
            egui::ComboBox::from_id_salt("duration_filter")
                .selected_text(
                    self.search_filters.duration.as_deref().unwrap_or("any length"),
                )
                .show_ui(ui, |ui| {
                    for (value, label) in [
                        (None, "any length"),
                        (Some("short"), "short"),
                        (Some("medium"), "medium"),
                        (Some("long"), "long"),
                    ] {
                        if ui
                            .selectable_label(
                                self.search_filters.duration.as_deref() == value,
                                label,
                            )
                            .clicked()
                        {
                            self.search_filters.duration = value.map(str::to_owned);
                        }
                    }
                });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("✕").clicked() {
                    self.search.close();
                }
            });
        });
    }

    fn draw_search_results(&mut self, ui: &mut egui::Ui) {
        if self.search.is_searching() {
            ui.label("Searching...");
            return;
        }
        if self.search.results().is_empty() {
            if self.search.has_searched() {
                ui.weak("No results found");
            }
            return;
        }
        let results = self.search.results().to_vec();
        enum ResultAction {
            Play(String),
            Add(usize),
        }
        let mut action: Option<ResultAction> = None;
        egui::ScrollArea::vertical()
            .max_height(260.0)
            .show(ui, |ui| {
                for (idx, result) in results.iter().enumerate() {
                    Frame::default()
                        .fill(CARD_BG)
                        .stroke(Stroke::new(1.0, CARD_BORDER))
                        .corner_radius(CornerRadius::same(6))
                        .inner_margin(Margin::symmetric(8, 6))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                self.draw_thumbnail(ui, &result.thumbnail, [56.0, 36.0]);
                                ui.vertical(|ui| {
                                    ui.label(RichText::new(&result.title).strong());
                                    ui.weak(&result.channel_title);
                                });
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        let add = egui::Button::new(
                                            RichText::new("Add").color(Color32::WHITE),
                                        )
                                        .fill(ACCENT_ADD);
                                        if ui.add(add).clicked() {
                                            action = Some(ResultAction::Add(idx));
                                        }
                                        let play = egui::Button::new(
                                            RichText::new("Play").color(Color32::WHITE),
                                        )
                                        .fill(ACCENT_PLAY);
                                        if ui.add(play).clicked() {
                                            action =
                                                Some(ResultAction::Play(result.id.clone()));
                                        }
                                    },
                                );
                            });
                        });
                    ui.add_space(4.0);
                }
            });
        match action {
            Some(ResultAction::Play(id)) => self.play_now(&id),
            Some(ResultAction::Add(idx)) => {
                let result = results[idx].clone();
                self.add_search_result(&result);
                self.search.close();
            }
            None => {}
        }
    }

    fn draw_playlist_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("playlist_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                Frame::default()
                    .fill(PANEL_FILL)
                    .inner_margin(Margin::symmetric(10, 10))
                    .show(ui, |ui| {
                        ui.heading("Playlist");
                        ui.separator();

                        ui.label("API key:");
                        let key_response = ui.add(
                            egui::TextEdit::singleline(&mut self.api_key_input)
                                .password(true)
                                .hint_text("YouTube Data API v3 key"),
                        );
                        if key_response.changed() {
                            let key = self.api_key_input.clone();
                            self.set_api_key(key);
                        }
                        if key_response.lost_focus() {
                            // A fresh key may unlock pending title lookups.
                            self.enrich_playlist();
                        }
                        ui.add_space(6.0);

                        ui.horizontal(|ui| {
                            let input = ui.add(
                                egui::TextEdit::singleline(&mut self.video_input)
                                    .hint_text("YouTube URL or video ID")
                                    .desired_width(200.0),
                            );
                            let submitted = input.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter));
                            if ui.button("➕ Add").clicked() || submitted {
                                self.add_video_from_input();
                            }
                        });
                        ui.add_space(8.0);

                        self.draw_playlist_entries(ui);

                        ui.add_space(8.0);
                        ui.separator();
                        ui.horizontal(|ui| {
                            if ui.button("🗑 Clear caches").clicked() {
                                self.clear_caches();
                            }
                            if let Some(version) = &self.cache_version {
                                ui.weak(version);
                            }
                        });
                    });
            });
    }

    fn draw_playlist_entries(&mut self, ui: &mut egui::Ui) {
        if self.playlist.is_empty() {
            ui.weak("Playlist is empty");
            return;
        }
        ui.label(format!("Videos ({}):", self.playlist.len()));
        let entries = self.playlist.entries().to_vec();
        let current = self.playlist.current_index();
        let mut play_idx: Option<usize> = None;
        let mut remove_idx: Option<usize> = None;
        egui::ScrollArea::vertical()
            .max_height(360.0)
            .show(ui, |ui| {
                for (idx, entry) in entries.iter().enumerate() {
                    let is_current = current == Some(idx);
                    let bg = if is_current {
                        Color32::from_rgba_unmultiplied(100, 200, 255, 30)
                    } else {
                        Color32::TRANSPARENT
                    };
                    Frame::group(ui.style())
                        .fill(bg)
                        .inner_margin(4.0)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(if is_current { "▶" } else { "○" });
                                self.draw_thumbnail(ui, &thumbnail_url(entry), [40.0, 24.0]);
                                let label = egui::Label::new(&entry.title)
                                    .truncate()
                                    .sense(egui::Sense::click());
                                if ui.add(label).clicked() {
                                    play_idx = Some(idx);
                                }
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button("✕").clicked() {
                                            remove_idx = Some(idx);
                                        }
                                    },
                                );
                            });
                        });
                }
            });
        if let Some(idx) = play_idx {
            self.play_index(idx);
        }
        if let Some(idx) = remove_idx {
            self.remove_index(idx);
        }
    }

    fn draw_central(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(Frame::default())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let bg_url = self.background.current_url();
                if let Some(bytes) = self.image_bytes(bg_url) {
                    egui::Image::from_bytes(
                        format!("bytes://{bg_url}"),
                        egui::load::Bytes::Shared(bytes),
                    )
                    .paint_at(ui, rect);
                } else {
                    ui.painter()
                        .rect_filled(rect, 0.0, Color32::from_rgb(10, 10, 20));
                }
                if self.blur_enabled {
                    // Frosted dim over the backdrop; the closest an
                    // immediate-mode canvas gets to a backdrop blur.
                    ui.painter().rect_filled(
                        rect,
                        0.0,
                        Color32::from_rgba_unmultiplied(10, 10, 20, 170),
                    );
                }
            });
        self.draw_player_card(ctx);
    }

    fn draw_player_card(&mut self, ctx: &egui::Context) {
        let Some(entry) = self.playlist.current_entry().cloned() else {
            // Detached playback still shows the frame with the raw id.
            if let Some(id) = self.player.now_playing().map(str::to_owned) {
                self.player_card_window(ctx, &id, None);
            }
            return;
        };
        let id = entry.id.clone();
        self.player_card_window(ctx, &id, Some(entry));
    }

    fn player_card_window(
        &mut self,
        ctx: &egui::Context,
        video_id: &str,
        entry: Option<PlaylistEntry>,
    ) {
        let screen = ctx.screen_rect();
        let default_pos = egui::Pos2::new(
            screen.center().x - 170.0,
            screen.bottom() - 170.0,
        );
        let pos = self.player_pos.unwrap_or(default_pos);

        let mut drag_delta: Option<egui::Vec2> = None;
        let mut reset = false;
        let mut open_embed = false;
        let mut step: Option<isize> = None;

        let area = egui::Area::new(egui::Id::new("player_card"))
            .fixed_pos(pos)
            .show(ctx, |ui| {
                Frame::default()
                    .fill(CARD_BG)
                    .stroke(Stroke::new(1.0, CARD_BORDER))
                    .corner_radius(CornerRadius::same(8))
                    .inner_margin(Margin::symmetric(12, 10))
                    .show(ui, |ui| {
                        ui.set_width(320.0);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("Now Playing").strong());
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    let handle = ui.add(
                                        egui::Label::new("⠿")
                                            .sense(egui::Sense::click_and_drag()),
                                    );
                                    if handle.dragged() {
                                        drag_delta = Some(handle.drag_delta());
                                    }
                                    self.dragging = handle.dragged();
                                    if handle.double_clicked() {
                                        reset = true;
                                    }
                                },
                            );
                        });
                        if let Some(entry) = &entry {
                            self.draw_thumbnail(ui, &thumbnail_url(entry), [296.0, 167.0]);
                            ui.label(RichText::new(&entry.title).strong());
                        } else {
                            ui.label(RichText::new(format!("Video {video_id}")).strong());
                        }
                        ui.horizontal(|ui| {
                            if ui.small_button("⏮").clicked() {
                                step = Some(-1);
                            }
                            let open = egui::Button::new(
                                RichText::new("▶ Open").color(Color32::WHITE),
                            )
                            .fill(ACCENT_PLAY);
                            if ui.add(open).clicked() {
                                open_embed = true;
                            }
                            if ui.small_button("⏭").clicked() {
                                step = Some(1);
                            }
                        });
                    });
            });

        if let Some(delta) = drag_delta {
            let size = area.response.rect.size();
            let mut next = pos + delta;
            next.x = next
                .x
                .clamp(VIEWPORT_MARGIN, (screen.width() - size.x - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN));
            next.y = next
                .y
                .clamp(VIEWPORT_MARGIN, (screen.height() - size.y - VIEWPORT_MARGIN).max(VIEWPORT_MARGIN));
            self.player_pos = Some(next);
        }
        if reset {
            self.player_pos = None;
        }
        if let Some(step) = step {
            self.step_playlist(step);
        }
        if open_embed {
            if let Some(url) = self.player.embed_url_ref().map(str::to_owned) {
                if let Err(e) = webbrowser::open(&url) {
                    self.show_error(format!("Failed to open browser: {e}"));
                }
            }
        }
    }

    /// Move the selection within the playlist; forward wraps to the start.
    fn step_playlist(&mut self, step: isize) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        let current = self.playlist.current_index().unwrap_or(0);
        let next = if step > 0 {
            (current + 1) % len
        } else {
            current.saturating_sub(1)
        };
        self.play_index(next);
    }

    fn draw_thumbnail(&self, ui: &mut egui::Ui, url: &str, size: [f32; 2]) {
        if url.is_empty() {
            return;
        }
        if let Some(bytes) = self.image_bytes(url) {
            ui.add(
                egui::Image::from_bytes(
                    format!("bytes://{url}"),
                    egui::load::Bytes::Shared(bytes),
                )
                .fit_to_exact_size(size.into())
                .corner_radius(3.0),
            );
        } else {
            // Not loaded (yet, or ever): keep the layout stable.
            let (rect, _) =
                ui.allocate_exact_size(size.into(), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, 3.0, Color32::from_rgb(35, 38, 48));
        }
    }

    fn draw_banners(&mut self, ctx: &egui::Context) {
        let mut dismissed: Option<usize> = None;
        let mut note_action: Option<(usize, NotificationAction)> = None;
        egui::Area::new(egui::Id::new("banners"))
            .anchor(egui::Align2::CENTER_TOP, [0.0, 48.0])
            .show(ctx, |ui| {
                for (idx, (message, _)) in self.errors.iter().enumerate() {
                    Frame::default()
                        .fill(Color32::from_rgba_unmultiplied(60, 12, 12, 230))
                        .stroke(Stroke::new(1.0, ERROR_RED))
                        .corner_radius(CornerRadius::same(6))
                        .inner_margin(Margin::symmetric(10, 6))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.colored_label(ERROR_RED, message);
                                if ui.small_button("✕").clicked() {
                                    dismissed = Some(idx);
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
                for (idx, note) in self.notifications.iter().enumerate() {
                    Frame::default()
                        .fill(CARD_BG)
                        .stroke(Stroke::new(1.0, CARD_BORDER))
                        .corner_radius(CornerRadius::same(6))
                        .inner_margin(Margin::symmetric(10, 6))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(&note.body);
                                if ui.small_button("Open App").clicked() {
                                    note_action = Some((idx, NotificationAction::Open));
                                }
                                if ui.small_button("Close").clicked() {
                                    note_action = Some((idx, NotificationAction::Close));
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
            });
        if let Some(idx) = dismissed {
            self.errors.remove(idx);
        }
        if let Some((idx, action)) = note_action {
            if action == NotificationAction::Open {
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            }
            self.notifications.remove(idx);
        }
    }
}

/// Best thumbnail for an entry: the enriched URL when present, else the
/// predictable video-frame thumbnail.
fn thumbnail_url(entry: &PlaylistEntry) -> String {
    if entry.thumbnail.is_empty() {
        player::frame_thumbnail_url(&entry.id)
    } else {
        entry.thumbnail.clone()
    }
}
