mod cli;
mod config;
mod consultation;
mod engine;
mod error;
mod reconcile;
mod store;
mod ui;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};
use config::LabflowConfig;
use consultation::{ConsultationDraft, FieldPatch, FollowUpDraft, Status, capabilities};
use engine::ConsultationEngine;
use error::LabflowError;
use store::{ConsultationApi, ConsultationQuery, ConsultationStore, MemoryStore, QuotationService};
use ui::OpProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = LabflowConfig::load()?;
    let operator = cli.operator.clone().unwrap_or_else(|| config.operator.clone());

    if let Command::Demo = cli.command {
        return run_demo(&config, &operator).await;
    }

    let store = ConsultationStore::new(config.base_url.clone(), config.token());
    let engine = ConsultationEngine::new(store, &config.quotation_prefix);
    run(cli, config, engine, operator).await
}

async fn run<S: ConsultationApi + QuotationService>(
    cli: Cli,
    config: LabflowConfig,
    mut engine: ConsultationEngine<S>,
    operator: String,
) -> Result<()> {
    match cli.command {
        Command::List { status, keyword, page } => {
            let query = ConsultationQuery {
                current: page,
                size: config.page_size,
                status: status.map(Into::into),
                keyword,
            };
            let progress = OpProgress::start("loading consultations");
            match engine.refresh(query).await {
                Ok(count) => {
                    progress.success(&format!("{count} consultation(s)"));
                    for record in engine.view() {
                        ui::print_row(record);
                    }
                }
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Show { id } => {
            let progress = OpProgress::start("loading consultation");
            match engine.fetch(id).await {
                Ok(()) => {
                    progress.success("loaded");
                    let record = engine.get(id).expect("record was just fetched");
                    ui::print_record(record);
                    ui::print_capabilities(&capabilities(
                        record.status,
                        record.quotation_no.is_some(),
                    ));
                }
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Create {
            company,
            contact,
            phone,
            sample,
            test_items,
            budget,
            follower,
        } => {
            let draft = ConsultationDraft {
                company,
                contact,
                phone,
                sample_description: sample,
                test_items,
                urgency: None,
                deadline: None,
                budget,
                follower,
                created_by: operator,
            };
            let progress = OpProgress::start("creating consultation");
            match engine.create(draft).await {
                Ok(id) => {
                    let record = engine.get(id).expect("created record is local");
                    progress.success(&format!(
                        "created {} (id {id}, {})",
                        record.consultation_no, record.status
                    ));
                }
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Update {
            id,
            company,
            contact,
            phone,
            sample,
            test_items,
            budget,
            follower,
            start_following,
        } => {
            let patch = FieldPatch {
                status: start_following.then_some(Status::Following),
                company,
                contact,
                phone,
                sample_description: sample,
                test_items,
                urgency: None,
                deadline: None,
                budget,
                follower,
            };
            let progress = OpProgress::start("updating consultation");
            let result = async {
                engine.fetch(id).await?;
                engine.update_fields(id, patch).await
            }
            .await;
            match result {
                Ok(()) => progress.success("updated"),
                Err(e) => fail(&progress, &e),
            }
        }

        Command::FollowUp {
            id,
            content,
            kind,
            next_action,
        } => {
            let draft = FollowUpDraft {
                kind: kind.into(),
                content,
                next_action,
                operator,
            };
            let progress = OpProgress::start("recording follow-up");
            let result = async {
                engine.fetch(id).await?;
                engine.add_follow_up(id, draft).await
            }
            .await;
            match result {
                Ok(()) => {
                    let count = engine.get(id).map(|r| r.follow_up_records.len()).unwrap_or(0);
                    progress.success(&format!("recorded ({count} total)"));
                }
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Feasibility { id, verdict, note, price } => {
            let progress = OpProgress::start("saving feasibility");
            let result = async {
                engine.fetch(id).await?;
                engine.set_feasibility(id, verdict.into(), note, price).await
            }
            .await;
            match result {
                Ok(()) => progress.success("saved"),
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Close { id } => {
            let progress = OpProgress::start("closing consultation");
            let result = async {
                engine.fetch(id).await?;
                engine.close(id).await
            }
            .await;
            match result {
                Ok(()) => progress.success("closed"),
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Quote { id } => {
            let progress = OpProgress::start("generating quotation");
            let result = async {
                engine.fetch(id).await?;
                engine.generate_quotation(id).await
            }
            .await;
            match result {
                Ok(number) => progress.success(&format!("quotation {number} linked")),
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Delete { id } => {
            let progress = OpProgress::start("deleting consultation");
            let result = async {
                engine.fetch(id).await?;
                engine.delete(id).await
            }
            .await;
            match result {
                Ok(()) => progress.success("deleted"),
                Err(e) => fail(&progress, &e),
            }
        }

        Command::Demo => unreachable!("demo is dispatched before the store is built"),
    }

    Ok(())
}

/// Surface the failure once and stop; store errors are never retried.
fn fail(progress: &OpProgress, error: &LabflowError) -> ! {
    progress.failure(&error.to_string());
    std::process::exit(1);
}

/// Offline lifecycle walkthrough against the in-memory store.
async fn run_demo(config: &LabflowConfig, operator: &str) -> Result<()> {
    let mut engine = ConsultationEngine::new(MemoryStore::new(), &config.quotation_prefix);

    println!("creating a pending consultation…");
    let id = engine
        .create(ConsultationDraft {
            company: "Acme Materials".into(),
            contact: "Wei Chen".into(),
            phone: Some("555-0101".into()),
            sample_description: Some("polymer pellets, 2kg".into()),
            test_items: Some("tensile strength, melt flow".into()),
            urgency: None,
            deadline: None,
            budget: Some(5000.0),
            follower: None,
            created_by: operator.to_string(),
        })
        .await?;
    ui::print_record(engine.get(id).expect("demo record is local"));
    ui::print_capabilities(&engine.capabilities_for(id).expect("demo record is local"));

    println!("\nassigning a follower and starting follow-up…");
    engine
        .update_fields(
            id,
            FieldPatch {
                status: Some(Status::Following),
                follower: Some(operator.to_string()),
                ..Default::default()
            },
        )
        .await?;
    engine
        .add_follow_up(
            id,
            FollowUpDraft {
                kind: consultation::FollowUpKind::Phone,
                content: "confirmed sample count and test scope".into(),
                next_action: Some("send price estimate".into()),
                operator: operator.to_string(),
            },
        )
        .await?;
    engine
        .set_feasibility(
            id,
            consultation::Feasibility::Feasible,
            Some("standard test suite".into()),
            Some(4800.0),
        )
        .await?;
    ui::print_record(engine.get(id).expect("demo record is local"));
    ui::print_capabilities(&engine.capabilities_for(id).expect("demo record is local"));

    println!("\ngenerating the quotation…");
    let number = engine.generate_quotation(id).await?;
    println!("  linked quotation {number}");
    ui::print_record(engine.get(id).expect("demo record is local"));
    ui::print_capabilities(&engine.capabilities_for(id).expect("demo record is local"));

    println!("\nthe quotation workflow rejects it externally…");
    engine.store().reject_quotation(id)?;
    engine.note_quotation_rejected(id).await?;
    ui::print_record(engine.get(id).expect("demo record is local"));

    Ok(())
}
