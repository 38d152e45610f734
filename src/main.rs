// ==========================================
// BrightEat 团餐拼单系统 - 命令行入口
// ==========================================
// 职责: 解析参数 → 调用 API → 本地化输出
// 日志写 stderr,结果写 stdout
// ==========================================

mod cli;

use std::path::Path;

use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use clap::Parser;

use brighteat::api::{ApiError, CreateOrderRequest, FeeSource};
use brighteat::app::{get_default_db_path, seed_data, AppState};
use brighteat::domain::types::{FeeSplitRule, UserRole};
use brighteat::engine::ItemRequest;
use brighteat::i18n;
use brighteat::{CollectionOrder, FeeBundle, Restaurant, User};

use cli::{Cli, Commands, ConfigCommand, CreateOrderArgs, RoleArg, RuleArg};

fn main() {
    let cli = Cli::parse();
    brighteat::logging::init(cli.log_json);

    if let Err(e) = run(cli) {
        let locale = i18n::current_locale();
        let (code, message) = match e.downcast_ref::<ApiError>() {
            Some(api_err) => (api_err.code(), api_err.to_string()),
            None => ("INTERNAL_ERROR", format!("{:#}", e)),
        };
        eprintln!(
            "{}",
            i18n::t_for(&locale, "cli.error", &[("code", code), ("message", &message)])
        );
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    // 语言: 命令行参数优先,其次为已保存的配置
    let locale = match cli.locale {
        Some(l) => l,
        None => state
            .config_manager
            .get_locale()
            .map_err(|e| anyhow::anyhow!("{}", e))?,
    };
    if !i18n::is_supported(&locale) {
        tracing::warn!("不支持的语言 {},使用默认语言", locale);
    }
    i18n::set_locale(&locale);
    let tr = |key: &str, args: &[(&str, &str)]| i18n::t_for(&locale, key, args);

    match cli.command {
        Commands::InitDb => {
            println!("{}", tr("cli.db_initialized", &[("path", state.get_db_path())]));
        }
        Commands::SeedData => {
            let report = seed_data(&state)?;
            println!(
                "{}",
                tr(
                    "cli.seed_done",
                    &[
                        ("created", &report.created.len().to_string()),
                        ("existing", &report.existing.len().to_string()),
                    ],
                )
            );
        }
        Commands::CreateUsers(args) => {
            let mut emails = args.emails;
            if let Some(file) = &args.file {
                let content = std::fs::read_to_string(file)
                    .with_context(|| format!("无法读取邮箱文件 {}", file.display()))?;
                emails.extend(
                    content
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty() && !l.starts_with('#'))
                        .map(str::to_string),
                );
            }
            if emails.is_empty() {
                bail!("未提供任何邮箱 (--emails 或 --file)");
            }

            let role = match args.role {
                RoleArg::User => UserRole::User,
                RoleArg::Manager => UserRole::Manager,
            };
            let report = state.user_api.create_users_from_emails(&emails, role)?;
            for cred in &report.created {
                println!("{}\t{}\t{}", cred.username, cred.email, cred.password);
            }
            for (email, reason) in &report.failed {
                eprintln!("{}: {}", email, reason);
            }
            println!(
                "{}",
                tr(
                    "cli.users_created",
                    &[
                        ("created", &report.created.len().to_string()),
                        ("skipped", &report.skipped.len().to_string()),
                        ("failed", &report.failed.len().to_string()),
                    ],
                )
            );
            if let Some(path) = &args.export {
                export_credentials(&state, path, &report.created, &tr)?;
            }
        }
        Commands::ListUsers => {
            for user in state.user_api.list_users()? {
                println!(
                    "{}\t{}\t{}\t{}",
                    user.username,
                    user.display_email(),
                    user.role,
                    if user.is_active { "active" } else { "inactive" }
                );
            }
        }
        Commands::RegeneratePasswords { export } => {
            let creds = state.user_api.regenerate_passwords()?;
            for cred in &creds {
                println!("{}\t{}\t{}", cred.username, cred.email, cred.password);
            }
            if let Some(path) = &export {
                export_credentials(&state, path, &creds, &tr)?;
            }
        }
        Commands::CreateOrder(args) => {
            let order = create_order(&state, args)?;
            println!(
                "{}",
                tr("cli.order_created", &[("code", &order.code), ("id", &order.order_id)])
            );
        }
        Commands::AddItem(args) => {
            let order = state.order_api.find_by_code(&args.code)?;
            let user = state.user_api.find_by_username(&args.user)?;
            let menu_item_id = match &args.menu_item {
                Some(name) => Some(find_menu_item_id(&state, &order.restaurant_id, name)?),
                None => None,
            };
            // 来源二选一的校验交给 API
            let req = ItemRequest {
                menu_item_id,
                custom_name: args.custom_name,
                custom_price: args.custom_price,
                quantity: args.qty,
            };
            let item = state.order_api.add_item(&order.order_id, &user.user_id, req)?;
            println!(
                "{}",
                tr(
                    "cli.item_added",
                    &[
                        ("name", &item.item_name),
                        ("qty", &item.quantity.to_string()),
                        ("total", &item.total_price.to_string()),
                    ],
                )
            );
        }
        Commands::Lock(args) => {
            let (order, actor) = resolve_order_and_actor(&state, &args.code, &args.actor)?;
            let order = state.order_api.lock(&order.order_id, &actor.user_id)?;
            print_transition(&order, &locale);
        }
        Commands::MarkOrdered(args) => {
            let (order, actor) = resolve_order_and_actor(&state, &args.code, &args.actor)?;
            let order = state.order_api.mark_ordered(&order.order_id, &actor.user_id)?;
            print_transition(&order, &locale);
        }
        Commands::Close(args) => {
            let (order, actor) = resolve_order_and_actor(&state, &args.code, &args.actor)?;
            let order = state.order_api.close(&order.order_id, &actor.user_id)?;
            print_transition(&order, &locale);
        }
        Commands::Summary { code, json } => {
            let order = state.order_api.find_by_code(&code)?;
            let summary = state.order_api.get_summary(&order.order_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            let status = tr(&format!("order.status.{}", summary.order.status), &[]);
            println!(
                "{}",
                tr(
                    "cli.summary_header",
                    &[
                        ("restaurant", &summary.restaurant_name),
                        ("code", &summary.order.code),
                        ("status", &status),
                    ],
                )
            );
            for item in &summary.items {
                println!(
                    "{}",
                    tr(
                        "cli.summary_item",
                        &[
                            ("user", &item.user_name),
                            ("name", &item.item_name),
                            ("qty", &item.quantity.to_string()),
                            ("price", &item.unit_price.to_string()),
                            ("total", &item.total_price.to_string()),
                        ],
                    )
                );
            }
            println!(
                "{}",
                tr(
                    "cli.summary_totals",
                    &[
                        ("items", &summary.total_items_cost.to_string()),
                        ("total", &summary.total_cost.to_string()),
                    ],
                )
            );
            for payment in &summary.payments {
                let payment_state = if payment.is_paid {
                    tr("cli.paid", &[])
                } else {
                    tr("cli.unpaid", &[])
                };
                println!(
                    "{}",
                    tr(
                        "cli.summary_payment",
                        &[
                            ("user", &payment.user_name),
                            ("subtotal", &payment.item_subtotal.to_string()),
                            ("fee", &payment.fee_share.to_string()),
                            ("amount", &payment.amount.to_string()),
                            ("state", &payment_state),
                        ],
                    )
                );
            }
            println!();
            println!("{}", summary.share_message);
        }
        Commands::MarkPaid(args) => {
            let order = state.order_api.find_by_code(&args.code)?;
            let payer = state.user_api.find_by_username(&args.user)?;
            let actor = match &args.actor {
                Some(name) => state.user_api.find_by_username(name)?,
                None => payer.clone(),
            };
            let payment = state
                .order_api
                .list_payments(&order.order_id)?
                .into_iter()
                .find(|p| p.user_id == payer.user_id)
                .ok_or_else(|| {
                    ApiError::NotFound(format!(
                        "拼单{}中没有{}的付款记录",
                        order.code, payer.username
                    ))
                })?;
            let payment = state.order_api.mark_paid(&payment.payment_id, &actor.user_id)?;
            println!(
                "{}",
                tr(
                    "cli.payment_marked",
                    &[("id", &payment.payment_id), ("amount", &payment.amount.to_string())],
                )
            );
        }
        Commands::AuditLog { code } => {
            let order = state.order_api.find_by_code(&code)?;
            for log in state.order_api.list_audit_logs(&order.order_id)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    log.action_ts.format("%Y-%m-%d %H:%M:%S"),
                    log.action_type,
                    log.actor_name,
                    log.detail.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Recommend {
            user,
            restaurant,
            text,
        } => {
            let author = state.user_api.find_by_username(&user)?;
            let restaurant_id = match &restaurant {
                Some(r) => Some(find_restaurant(&state, r)?.restaurant_id),
                None => None,
            };
            let rec = state.catalog_api.add_recommendation(
                &author.user_id,
                restaurant_id.as_deref(),
                &text,
            )?;
            println!(
                "{}",
                tr("cli.recommendation_added", &[("id", &rec.recommendation_id)])
            );
        }
        Commands::Recommendations { restaurant } => {
            let restaurant_id = match &restaurant {
                Some(r) => Some(find_restaurant(&state, r)?.restaurant_id),
                None => None,
            };
            let general = tr("cli.general_recommendation", &[]);
            for rec in state
                .catalog_api
                .list_recommendations(restaurant_id.as_deref())?
            {
                println!(
                    "{}\t{}\t{}\t{}",
                    rec.created_at.format("%Y-%m-%d %H:%M"),
                    rec.user_name,
                    rec.restaurant_name.as_deref().unwrap_or(&general),
                    rec.text
                );
            }
        }
        Commands::Config(cmd) => run_config(&state, cmd)?,
    }

    Ok(())
}

// ==========================================
// 辅助函数
// ==========================================

/// 按名称或 ID 查找餐厅
fn find_restaurant(state: &AppState, name_or_id: &str) -> anyhow::Result<Restaurant> {
    let restaurant = match state.catalog_api.find_restaurant_by_name(name_or_id)? {
        Some(r) => r,
        None => state.catalog_api.get_restaurant(name_or_id)?,
    };
    Ok(restaurant)
}

fn create_order(state: &AppState, args: CreateOrderArgs) -> anyhow::Result<CollectionOrder> {
    let restaurant = find_restaurant(state, &args.restaurant)?;
    let collector = state.user_api.find_by_username(&args.collector)?;

    let fees = match &args.preset {
        Some(name) => {
            let preset = state
                .fee_preset_api
                .find_preset_by_name(name)?
                .ok_or_else(|| ApiError::not_found("FeePreset", name))?;
            FeeSource::Preset(preset.preset_id)
        }
        None => FeeSource::Explicit(FeeBundle::new(
            args.delivery_fee.unwrap_or_default(),
            args.tip.unwrap_or_default(),
            args.service_fee.unwrap_or_default(),
        )),
    };

    let mut req = CreateOrderRequest::new(&restaurant.restaurant_id, &collector.user_id, fees);
    req.fee_split_rule = args.rule.map(|r| match r {
        RuleArg::Equal => FeeSplitRule::Equal,
        RuleArg::Weighted => FeeSplitRule::Weighted,
    });
    req.is_private = args.private;
    req.instapay_link = args.instapay;
    req.cutoff_time = match &args.cutoff {
        Some(s) => Some(
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
                .map_err(|_| ApiError::InvalidInput(format!("截单时间格式错误: {}", s)))?,
        ),
        None => None,
    };
    for username in &args.assign {
        let user = state.user_api.find_by_username(username.trim())?;
        req.assigned_user_ids.push(user.user_id);
    }

    Ok(state.order_api.create_order(req)?)
}

/// 按名称在餐厅的启用菜单中查找菜品（不区分大小写）
fn find_menu_item_id(state: &AppState, restaurant_id: &str, name: &str) -> anyhow::Result<String> {
    for menu in state.catalog_api.list_menus(restaurant_id)? {
        if !menu.is_active {
            continue;
        }
        if let Some(item) = state
            .catalog_api
            .list_menu_items(&menu.menu_id)?
            .into_iter()
            .find(|i| i.name.eq_ignore_ascii_case(name.trim()))
        {
            return Ok(item.menu_item_id);
        }
    }
    Err(ApiError::not_found("MenuItem", name).into())
}

fn resolve_order_and_actor(
    state: &AppState,
    code: &str,
    username: &str,
) -> anyhow::Result<(CollectionOrder, User)> {
    let order = state.order_api.find_by_code(code)?;
    let actor = state.user_api.find_by_username(username)?;
    Ok((order, actor))
}

fn print_transition(order: &CollectionOrder, locale: &str) {
    let status = i18n::t_for(locale, &format!("order.status.{}", order.status), &[]);
    println!(
        "{}",
        i18n::t_for(
            locale,
            "cli.transition_done",
            &[("code", &order.code), ("status", &status)]
        )
    );
}

fn export_credentials(
    state: &AppState,
    path: &Path,
    creds: &[brighteat::api::Credential],
    tr: &dyn Fn(&str, &[(&str, &str)]) -> String,
) -> anyhow::Result<()> {
    state.user_api.export_credentials_csv(path, creds)?;
    let shown = path.display().to_string();
    println!("{}", tr("cli.credentials_exported", &[("path", &shown)]));
    Ok(())
}

fn run_config(state: &AppState, cmd: ConfigCommand) -> anyhow::Result<()> {
    let config = &state.config_manager;
    match cmd {
        ConfigCommand::List => {
            let snapshot = config.get_snapshot().map_err(|e| anyhow::anyhow!("{}", e))?;
            let values: serde_json::Value = serde_json::from_str(&snapshot)?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        ConfigCommand::Get { key } => {
            let snapshot = config.get_snapshot().map_err(|e| anyhow::anyhow!("{}", e))?;
            let values: serde_json::Value = serde_json::from_str(&snapshot)?;
            match values.get(&key) {
                Some(serde_json::Value::String(s)) => println!("{}", s),
                Some(other) => println!("{}", other),
                None => bail!("未知配置项: {}", key),
            }
        }
        ConfigCommand::Set { key, value } => {
            config
                .set_value(&key, &value)
                .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
            tracing::info!(key = %key, value = %value, "配置已更新");
        }
        ConfigCommand::Unset { key } => {
            let removed = config.unset_value(&key).map_err(|e| anyhow::anyhow!("{}", e))?;
            if !removed {
                tracing::warn!(key = %key, "配置项未设置,无需删除");
            }
        }
    }
    Ok(())
}
