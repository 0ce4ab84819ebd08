mod typing;

use std::time::{Duration, Instant};

use clap::Parser;
use eframe::{egui, Frame};
use egui::{Color32, Context, RichText};

use reqwest::blocking::Client;
use reqwest::Result;
use serde::Deserialize;

use typing::{TypingEffect, TYPING_DELAY};

/// Number of predictions requested.
const TOP_K: usize = 3;

/// Number of words added by "Generate Sentence".
const GENERATE_STEPS: usize = 14;

#[derive(Parser, Debug)]
#[command(name = "rs-nwp-ui", about = "Next word prediction front-end")]
struct Args {
    /// Base URL of the prediction server
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
}

/// One ranked word, as returned by `/v1/predict`.
#[derive(Debug, Deserialize)]
struct Prediction {
    word: String,
    probability: f32,
}

/// Body of `/v1/generate`.
#[derive(Debug, Deserialize)]
struct Generated {
    text: String,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
    base_url: String,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(5, 0))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// Sends a GET request to `/v1/predict`.
    fn get_predictions(&self, text: &str, k: usize) -> Result<Vec<Prediction>> {
        let k = k.to_string();
        self.client
            .get(format!("{}/v1/predict", self.base_url))
            .query(&[("text", text), ("k", k.as_str())])
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a GET request to `/v1/generate`.
    fn get_generated(&self, text: &str, steps: usize) -> Result<String> {
        let steps = steps.to_string();
        let generated: Generated = self.client
            .get(format!("{}/v1/generate", self.base_url))
            .query(&[("text", text), ("steps", steps.as_str())])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(generated.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Theme {
    Light,
    Dark,
}

/// Colors of one theme.
struct Palette {
    card: Color32,
    card_light: Color32,
    accent: Color32,
}

impl Theme {
    fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }

    fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                card: Color32::from_rgb(0x1e, 0x29, 0x3b),
                card_light: Color32::from_rgb(0x24, 0x34, 0x47),
                accent: Color32::from_rgb(0x38, 0xbd, 0xf8),
            },
            Theme::Light => Palette {
                card: Color32::from_rgb(0xe2, 0xe8, 0xf0),
                card_light: Color32::from_rgb(0xed, 0xf2, 0xf7),
                accent: Color32::from_rgb(0x25, 0x63, 0xeb),
            },
        }
    }
}

/// What the output area currently shows.
enum Output {
    Nothing,
    Predictions(Vec<Prediction>),
    Generated(TypingEffect),
    Warning(String),
    Error(String),
}

/// Global UI state (MUST persist between frames in egui).
struct PredictorUI {
    rest: RESTContext,
    input: String,
    theme: Theme,
    output: Output,
}

impl PredictorUI {
    fn new(server: &str) -> Result<Self> {
        Ok(Self {
            rest: RESTContext::new(server)?,
            input: "Ham. Vpon what".to_owned(),
            theme: Theme::Light,
            output: Output::Nothing,
        })
    }

    /// Returns the input, or shows a warning if it is blank.
    fn checked_input(&mut self) -> Option<String> {
        if self.input.trim().is_empty() {
            self.output = Output::Warning("Please enter some text.".to_owned());
            return None;
        }
        Some(self.input.clone())
    }

    /// Performs the prediction request.
    fn predict(&mut self) {
        let Some(text) = self.checked_input() else { return };
        self.output = match self.rest.get_predictions(&text, TOP_K) {
            Ok(predictions) if predictions.is_empty() => {
                Output::Error("Could not predict the next word.".to_owned())
            }
            Ok(predictions) => Output::Predictions(predictions),
            Err(e) => {
                log::warn!("Prediction request failed: {e}");
                Output::Error(format!("Error: {e}"))
            }
        };
    }

    /// Performs the generation request and starts the typing animation.
    fn generate(&mut self) {
        let Some(text) = self.checked_input() else { return };
        self.output = match self.rest.get_generated(&text, GENERATE_STEPS) {
            Ok(sentence) => Output::Generated(TypingEffect::new(sentence, Instant::now())),
            Err(e) => {
                log::warn!("Generation request failed: {e}");
                Output::Error(format!("Error: {e}"))
            }
        };
    }

    fn card(ui: &mut egui::Ui, fill: Color32, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
    }

    fn show_output(&self, ui: &mut egui::Ui) {
        let palette = self.theme.palette();
        match &self.output {
            Output::Nothing => {}
            Output::Warning(message) => {
                ui.colored_label(Color32::from_rgb(0xd9, 0x77, 0x06), message);
            }
            Output::Error(message) => {
                ui.colored_label(Color32::from_rgb(0xdc, 0x26, 0x26), message);
            }
            Output::Predictions(predictions) => {
                Self::card(ui, palette.card, |ui| {
                    ui.label(RichText::new(format!("Top-{TOP_K} Predicted Words:")).strong());
                });
                for prediction in predictions {
                    Self::card(ui, palette.card_light, |ui| {
                        ui.horizontal(|ui| {
                            ui.label("➡");
                            ui.label(RichText::new(&prediction.word).strong().size(20.0).color(palette.accent));
                            ui.label(format!("(confidence: {:.2})", prediction.probability));
                        });
                    });
                }
            }
            Output::Generated(typing) => {
                Self::card(ui, palette.card, |ui| {
                    ui.label(RichText::new("Generated Sentence:").strong());
                });
                Self::card(ui, palette.card_light, |ui| {
                    ui.label(RichText::new(typing.visible(Instant::now())).size(18.0));
                });
            }
        }
    }
}

impl eframe::App for PredictorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        ctx.set_visuals(self.theme.visuals());
        let accent = self.theme.palette().accent;

        egui::SidePanel::left("theme_panel").resizable(false).show(ctx, |ui| {
            ui.label(RichText::new("Theme").strong());
            ui.radio_value(&mut self.theme, Theme::Light, "Light");
            ui.radio_value(&mut self.theme, Theme::Dark, "Dark");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(RichText::new("Next Word Prediction System").strong().color(accent));
            });
            ui.add_space(8.0);

            ui.label(RichText::new("Enter a sequence of words").strong());
            ui.add(egui::TextEdit::singleline(&mut self.input).desired_width(f32::INFINITY));

            ui.horizontal(|ui| {
                if ui.add_sized([200.0, 36.0], egui::Button::new("Predict Next Words")).clicked() {
                    self.predict();
                }
                if ui.add_sized([200.0, 36.0], egui::Button::new("Generate Sentence")).clicked() {
                    self.generate();
                }
            });
            ui.add_space(8.0);

            self.show_output(ui);
        });

        if let Output::Generated(typing) = &self.output {
            if !typing.is_done(Instant::now()) {
                ctx.request_repaint_after(TYPING_DELAY);
            }
        }
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 480.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "rs-nwp",
        options,
        Box::new(move |_| Ok(Box::new(PredictorUI::new(&args.server)?))),
    )
}
