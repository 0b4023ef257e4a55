use std::time::Instant;

use eframe::egui::{self, Align, Color32, Layout, RichText, Ui};

use crate::channel::{ConnectionStatus, UpdateChannel};
use crate::config::LayoutMode;
use crate::session::VisualizationSession;
use crate::status::{StatusRow, StatusTable};
use crate::util::{format_bytes, format_count};

use super::super::ViewModel;
use super::super::render_utils::network_color;

const ONLINE_COLOR: Color32 = Color32::from_rgb(16, 185, 129);
const OFFLINE_COLOR: Color32 = Color32::from_rgb(239, 68, 68);
const MUTED_COLOR: Color32 = Color32::from_rgb(148, 163, 184);

impl ViewModel {
    pub(in crate::app) fn draw_top_bar(
        &mut self,
        ui: &mut Ui,
        session: &VisualizationSession,
        channel: &UpdateChannel,
        source_label: Option<&str>,
        restart_requested: &mut bool,
    ) {
        ui.horizontal(|ui| {
            ui.heading("netviz");
            ui.separator();

            let status = channel.status();
            let status_color = match status {
                ConnectionStatus::Connected => ONLINE_COLOR,
                ConnectionStatus::Disconnected => OFFLINE_COLOR,
            };
            ui.colored_label(status_color, "●");
            ui.label(status.label());
            if let Some(source_label) = source_label {
                ui.label(RichText::new(source_label).small().color(MUTED_COLOR));
            }
            ui.separator();

            let (nodes, edges) = session
                .graph()
                .map(|graph| (graph.node_count(), graph.edge_count()))
                .unwrap_or_default();
            ui.label(format!("nodes: {nodes}"));
            ui.label(format!("edges: {edges}"));
            ui.label(format!("layout: {}", session.layout().mode().label()));
            if let Some(alpha) = session.layout().energy() {
                ui.label(RichText::new(format!("alpha {alpha:.3}")).color(MUTED_COLOR));
            }

            let can_restart =
                session.layout().mode() == LayoutMode::Simulated && session.graph().is_some();
            if ui
                .add_enabled(can_restart, egui::Button::new("Re-run layout"))
                .clicked()
            {
                *restart_requested = true;
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if self.status_enabled {
                    ui.checkbox(&mut self.show_status_table, "Status table");
                }
                ui.label(format!("zoom {:.0}%", self.zoom * 100.0));
                ui.label(format!("frames: {}", channel.frames_processed()));
            });
        });
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, session: &mut VisualizationSession, now: Instant) {
        let activity = session.activity();
        ui.heading(format!("Activity ({}/{})", activity.log_len(), activity.capacity()));
        ui.add_space(4.0);

        if activity.log_len() == 0 {
            ui.label(RichText::new("No activity yet.").color(MUTED_COLOR));
        } else {
            egui::ScrollArea::vertical()
                .id_salt("activity_log_scroll")
                .max_height(220.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for event in activity.log() {
                        let text = RichText::new(event.summary()).monospace();
                        let text = if activity.is_emphasized(&event.node, now) {
                            text.color(Color32::from_rgb(250, 204, 21))
                        } else {
                            text
                        };
                        let label = ui.label(text);
                        if let (Some(rx), Some(tx)) = (event.rx_packets, event.tx_packets) {
                            label.on_hover_text(format!(
                                "packets ↓{} ↑{}",
                                format_count(rx),
                                format_count(tx)
                            ));
                        }
                    }
                });
        }

        if let Some(graph) = session.graph()
            && !graph.networks.is_empty()
        {
            ui.separator();
            ui.label(RichText::new("Networks").strong());
            for network in &graph.networks {
                ui.horizontal(|ui| {
                    ui.colored_label(network_color(&network.id).to_opaque(), "■");
                    ui.label(network.label.as_deref().unwrap_or(network.id.as_str()))
                        .on_hover_text(network.members.join(", "));
                    ui.label(
                        RichText::new(format!("{} members", network.members.len())).color(MUTED_COLOR),
                    );
                });
            }
        }

        ui.separator();
        ui.label(RichText::new("Traffic totals").strong());
        let running = session
            .stats()
            .iter()
            .filter(|(_, stats)| stats.is_running())
            .collect::<Vec<_>>();
        if running.is_empty() {
            ui.label(RichText::new("No running nodes reported.").color(MUTED_COLOR));
        } else {
            egui::Grid::new("traffic_totals")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (name, stats) in running {
                        ui.label(format!("{name}:"));
                        ui.label(format_bytes(stats.total_bytes()));
                        ui.end_row();
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new("Router FORWARD chain").strong());
        match session.iptables() {
            Some(output) => {
                egui::ScrollArea::both()
                    .id_salt("iptables_scroll")
                    .max_height(220.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        ui.label(RichText::new(output).monospace().small());
                    });
            }
            None => {
                ui.label(RichText::new("No iptables output received.").color(MUTED_COLOR));
            }
        }

        let mut dismiss = false;
        if let Some(diagnostic) = session.diagnostic() {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label(RichText::new("Last problem").strong());
                if ui.small_button("Dismiss").clicked() {
                    dismiss = true;
                }
            });
            ui.label(
                RichText::new(format!("[{}] {}", diagnostic.clock, diagnostic.error))
                    .color(OFFLINE_COLOR),
            );
        }
        if dismiss {
            session.clear_diagnostic();
        }
    }

    pub(in crate::app) fn draw_status_table(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Node status").strong());
            if let StatusTable::Rows { updated, .. } = &self.status_table {
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.label(RichText::new(format!("Last updated: {updated}")).color(MUTED_COLOR));
                });
            }
        });
        ui.add_space(4.0);

        match &self.status_table {
            StatusTable::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading status...");
                });
            }
            StatusTable::Empty => {
                ui.label(RichText::new("No containers found.").color(MUTED_COLOR));
            }
            StatusTable::Failed(message) => {
                ui.label(RichText::new(message.as_str()).color(OFFLINE_COLOR));
            }
            StatusTable::Rows { rows, .. } => {
                egui::ScrollArea::vertical()
                    .id_salt("status_table_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        egui::Grid::new("status_table_grid")
                            .num_columns(6)
                            .striped(true)
                            .spacing([18.0, 6.0])
                            .show(ui, |ui| {
                                for heading in ["Name", "Status", "RX", "TX", "RX packets", "TX packets"] {
                                    ui.label(RichText::new(heading).strong());
                                }
                                ui.end_row();

                                for row in rows {
                                    draw_status_row(ui, row);
                                }
                            });
                    });
            }
        }
    }
}

fn draw_status_row(ui: &mut Ui, row: &StatusRow) {
    ui.label(RichText::new(row.name.as_str()).monospace());
    ui.vertical(|ui| {
        let color = if row.running { ONLINE_COLOR } else { OFFLINE_COLOR };
        ui.colored_label(color, row.status_label());
        if let Some(error) = &row.error {
            ui.label(RichText::new(error.as_str()).small().color(MUTED_COLOR));
        }
    });
    ui.label(format_bytes(row.rx_bytes));
    ui.label(format_bytes(row.tx_bytes));
    ui.label(format_count(row.rx_packets));
    ui.label(format_count(row.tx_packets));
    ui.end_row();
}
