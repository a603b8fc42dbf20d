//! Pipeline controller
//!
//! Sequences the mandatory pre-stages and the requested analyses in
//! canonical order, one subprocess at a time, then aggregates every
//! parser's metrics into a single report row.
//!
//! Failure policy: a failed sub-step inside a mandatory pre-stage aborts
//! the run; a failed sub-step inside an optional analysis is recorded, the
//! remaining stages still run, and the stage's metrics degrade to FAILED
//! sentinels in the report.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::config::{Analysis, PipelineConfig};
use crate::engine::context::RunContext;
use crate::engine::error::PipelineError;
use crate::engine::log::RunLog;
use crate::engine::result::{MetricsRow, StageReport, StepResult};
use crate::parsers;
use crate::stages;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub metrics: MetricsRow,
    pub report_path: PathBuf,
    pub log_path: PathBuf,
}

/// Stage reports collected while the run progresses, in canonical order.
#[derive(Default)]
struct StageReports {
    agat: Option<StageReport>,
    busco: Option<StageReport>,
    psauron: Option<StageReport>,
    omark: Option<StageReport>,
    detenga: Option<StageReport>,
    prothomology: Option<StageReport>,
    lai: Option<StageReport>,
    rnaseq: Option<StageReport>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        fs::create_dir_all(&self.config.basedir)?;
        let mut log = RunLog::create(&self.config.basedir)?;
        let log_path = log.path().to_path_buf();

        let banner = format!(
            "\t\t\t###############\n\t\t\t##   GAQET   ##\n\t\t\t###############\n\n{}\n{}\n",
            VERSION,
            chrono::Local::now().format("%a %b %e %T %Y")
        );
        log.emit(&banner);
        log.emit(&format!(
            "#Results will be stored at {}\n",
            self.config.basedir.display()
        ));

        let overall = Instant::now();
        let context = self.run_pre_stages(&mut log).await?;
        let reports = self.run_analyses(&mut log, &context).await;
        let metrics = self.collect_metrics(&context, &reports);
        let report_path = self.write_report(&metrics)?;

        log.emit(&format!(
            "GAQET finished at {}, runtime: {:.2} minutes",
            chrono::Local::now().format("%a %b %e %T %Y"),
            overall.elapsed().as_secs_f64() / 60.0
        ));

        Ok(PipelineOutcome {
            metrics,
            report_path,
            log_path,
        })
    }

    /// Run the mandatory pre-stages and seed the run context. Any failure
    /// here is fatal, except the assembly reformat: when that fails the
    /// original assembly stays in use and the run continues.
    async fn run_pre_stages(&self, log: &mut RunLog) -> Result<RunContext, PipelineError> {
        let config = &self.config;
        let mut context = RunContext::new(&config.annotation, &config.assembly);

        log.section("Splitting annotation by features");
        let start = Instant::now();
        let split = stages::prepare::split_annotation(config);
        emit_step(log, "Separate annotation by type", &split);
        log.emit(&format!(
            "Time consumed splitting annotation: {:.2}s\n",
            start.elapsed().as_secs_f64()
        ));
        let split_output = fatal_on_failure("annotation splitting", &split)?;
        context.annotation = split_output;

        log.section("Checking if Assembly file has a correct length format");
        let standard = stages::prepare::has_standard_line_length(&config.assembly)?;
        if !standard {
            log.section("Reformatting Assembly file with seqtk");
            let start = Instant::now();
            let reformat = stages::prepare::reformat_assembly(config).await;
            emit_step(log, "Reformat Assembly file", &reformat);
            if !reformat.is_failed() {
                if let Some(path) = reformat.output {
                    context.assembly = path;
                }
            }
            log.emit(&format!(
                "Time consumed reformatting Assembly file: {:.2}s\n",
                start.elapsed().as_secs_f64()
            ));
        }

        log.section("Getting longest isoforms");
        let start = Instant::now();
        let longest = stages::prepare::longest_isoform(config, &context.annotation).await;
        emit_step(log, "Getting longest isoforms", &longest);
        log.emit(&format!(
            "Time consumed getting longest isoforms: {:.2}s\n",
            start.elapsed().as_secs_f64()
        ));
        let longest_output = fatal_on_failure("longest isoform extraction", &longest)?;
        context.longest_isoform_annotation = Some(longest_output);

        log.section("Extracting CDS and protein sequences");
        let start = Instant::now();
        let gffread = stages::gffread::run_gffread(
            config,
            &context.annotation,
            context.longest_isoform(),
            &context.assembly,
        )
        .await;
        for (kind, result) in gffread.iter() {
            emit_step(log, &format!("{} extraction", kind), result);
        }
        log.emit(&format!(
            "Time consumed extracting CDS and proteins: {:.2}s\n",
            start.elapsed().as_secs_f64()
        ));
        if let Some((kind, failed)) = gffread.iter().find(|(_, result)| result.is_failed()) {
            return Err(PipelineError::MandatoryStageFailed {
                stage: format!("gffread {} extraction", kind),
                detail: failed.status.message().to_string(),
            });
        }
        context.extracted = stages::gffread::extracted_sequences(&gffread);

        Ok(context)
    }

    /// Run every requested analysis in canonical order, recording elapsed
    /// wall-clock time per stage. Failures are embedded, never raised.
    async fn run_analyses(&self, log: &mut RunLog, context: &RunContext) -> StageReports {
        let config = &self.config;
        let mut reports = StageReports::default();
        let Some(extracted) = context.extracted.as_ref() else {
            return reports;
        };

        for analysis in config.ordered_analyses() {
            let start = Instant::now();
            match analysis {
                Analysis::Agat => {
                    log.section("Running AGAT on the GFF file");
                    let report =
                        stages::agat::run_agat(config, &context.annotation, &context.assembly)
                            .await;
                    emit_stage(log, &report);
                    reports.agat = Some(report);
                }
                Analysis::Busco => {
                    log.section("Running BUSCO");
                    // The deduplicated protein set unless the filter is off.
                    let proteins = if config.disable_busco_filter {
                        &extracted.proteins_longest
                    } else {
                        &extracted.proteins_busco
                    };
                    let report = stages::busco::run_busco(config, proteins).await;
                    emit_stage(log, &report);
                    reports.busco = Some(report);
                }
                Analysis::Psauron => {
                    log.section("Running PSAURON");
                    let report = stages::psauron::run_psauron(config, &extracted.cds).await;
                    emit_stage(log, &report);
                    reports.psauron = Some(report);
                }
                Analysis::Omark => {
                    log.section("Running OMARK");
                    let report =
                        stages::omark::run_omark(config, &extracted.proteins_longest).await;
                    emit_stage(log, &report);
                    reports.omark = Some(report);
                }
                Analysis::Detenga => {
                    log.section("Running DeTEnGA");
                    let report = stages::detenga::run_detenga(
                        config,
                        &extracted.proteins,
                        &extracted.mrna,
                    )
                    .await;
                    emit_stage(log, &report);
                    reports.detenga = Some(report);
                }
                Analysis::Prothomology => {
                    log.section("Running Protein homology");
                    let report =
                        stages::prothomology::run_protein_homology(config, &extracted.proteins)
                            .await;
                    emit_stage(log, &report);
                    reports.prothomology = Some(report);
                }
                Analysis::Lai => {
                    log.section("Running LAI");
                    let report = stages::lai::run_lai(config, &context.assembly).await;
                    emit_stage(log, &report);
                    reports.lai = Some(report);
                }
                Analysis::Rnaseq => {
                    log.section("Running RNA-seq agreement");
                    let report = stages::rnaseq::run_rnaseq(config, &context.annotation).await;
                    emit_stage(log, &report);
                    reports.rnaseq = Some(report);
                }
            }
            log.emit(&format!(
                "Time consumed running {}: {:.2}s\n",
                analysis,
                start.elapsed().as_secs_f64()
            ));
        }
        reports
    }

    /// Call each executed stage's parser and merge the fragments in
    /// canonical order. Header and data row are later built from this one
    /// row, so column order is fixed here.
    fn collect_metrics(&self, context: &RunContext, reports: &StageReports) -> MetricsRow {
        let config = &self.config;
        let mut metrics = MetricsRow::new();

        if let Some(agat) = &reports.agat {
            metrics.merge(parsers::agat::parse_agat_stats(agat));
            metrics.merge(parsers::agat::parse_agat_premature(agat));
        }
        let transcripts = parsers::agat::transcript_models(&metrics)
            .or_else(|| {
                context
                    .extracted
                    .as_ref()
                    .and_then(|extracted| count_fasta_records(&extracted.mrna))
            })
            .unwrap_or(0);
        if let Some(agat) = &reports.agat {
            metrics.merge(parsers::agat::parse_agat_incomplete(agat, transcripts));
        }
        if let Some(busco) = &reports.busco {
            metrics.merge(parsers::busco::busco_stats(busco, &config.busco_lineages));
        }
        if let Some(psauron) = &reports.psauron {
            metrics.merge(parsers::psauron::psauron_stats(psauron));
        }
        if let Some(omark) = &reports.omark {
            metrics.merge(parsers::omark::omark_stats(omark));
        }
        if let Some(detenga) = &reports.detenga {
            metrics.merge(parsers::detenga::detenga_stats(detenga, transcripts));
        }
        if let Some(prothomology) = &reports.prothomology {
            let tags: Vec<String> = config
                .prothomology_tags
                .iter()
                .map(|db| db.tag.clone())
                .collect();
            metrics.merge(parsers::prothomology::protein_homology_stats(
                prothomology,
                transcripts,
                &tags,
            ));
        }
        if let Some(lai) = &reports.lai {
            metrics.merge(parsers::lai::lai_stats(lai));
        }
        if let Some(rnaseq) = &reports.rnaseq {
            metrics.merge(parsers::rnaseq::rnaseq_stats(rnaseq));
        }
        metrics
    }

    /// Write `{ID}_GAQET.stats.tsv`: the identity columns, then every
    /// metric in merge order. Header and data line come from the same
    /// iteration.
    fn write_report(&self, metrics: &MetricsRow) -> Result<PathBuf, PipelineError> {
        let config = &self.config;
        let outfile = config
            .basedir
            .join(format!("{}_GAQET.stats.tsv", config.id));
        let mut writer = BufWriter::new(File::create(&outfile)?);

        let mut header = vec![
            "Species".to_string(),
            "NCBI_TaxID".to_string(),
            "Assembly_Version".to_string(),
            "Annotation_Version".to_string(),
        ];
        let mut row = vec![
            config.id.clone(),
            config.omark_taxid.clone().unwrap_or_else(|| "NA".to_string()),
            file_name_of(&config.assembly),
            file_name_of(&config.annotation),
        ];
        for (key, value) in metrics.keys().zip(metrics.values()) {
            header.push(key.to_string());
            row.push(value.to_string());
        }
        writeln!(writer, "{}", header.join("\t"))?;
        writeln!(writer, "{}", row.join("\t"))?;
        writer.flush()?;
        info!(report = %outfile.display(), "report written");
        Ok(outfile)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn fatal_on_failure(stage: &str, result: &StepResult) -> Result<PathBuf, PipelineError> {
    if result.is_failed() {
        return Err(PipelineError::MandatoryStageFailed {
            stage: stage.to_string(),
            detail: result.status.message().to_string(),
        });
    }
    result
        .output
        .clone()
        .ok_or_else(|| PipelineError::MandatoryStageFailed {
            stage: stage.to_string(),
            detail: "no output artifact recorded".to_string(),
        })
}

fn emit_step(log: &mut RunLog, title: &str, result: &StepResult) {
    log.emit(&format!("#{}, command used: \n\t{}\n", title, result.command));
    log.emit_status(result.status.message());
}

fn emit_stage(log: &mut RunLog, report: &StageReport) {
    for (name, result) in report.iter() {
        emit_step(log, name, result);
    }
}

/// Number of `>` headers in a FASTA file, used as the transcript-count
/// fallback when AGAT was not requested.
fn count_fasta_records(path: &Path) -> Option<i64> {
    let file = File::open(path).ok()?;
    let mut count = 0i64;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if line.starts_with('>') {
            count += 1;
        }
    }
    Some(count)
}
