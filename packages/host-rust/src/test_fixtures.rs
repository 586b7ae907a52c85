//! Host objects shared by the unit tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use objbridge_core::{TypeDesc, Value};
use parking_lot::Mutex;

use crate::config::RepositoryConfig;
use crate::reflect::{HostFunction, HostObject, HostValue, ParamInfo, TypeInfo};
use crate::repository::ObjectRepository;

/// Repository that accepts synchronous registrations.
pub(crate) fn sync_repository() -> ObjectRepository {
    ObjectRepository::new(RepositoryConfig {
        allow_sync_binding: true,
        ..RepositoryConfig::default()
    })
}

fn int_arg(args: &[HostValue], index: usize) -> anyhow::Result<i64> {
    args.get(index)
        .and_then(HostValue::as_value)
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("argument {index} must be an integer"))
}

fn render(arg: &HostValue) -> String {
    match arg {
        HostValue::Missing => "missing".to_string(),
        HostValue::Value(Value::Int(i)) => i.to_string(),
        HostValue::Value(Value::String(s)) => s.clone(),
        HostValue::Value(Value::Array(items)) => {
            let items: Vec<String> = items.iter().map(|v| render(&HostValue::Value(v.clone()))).collect();
            format!("[{}]", items.join(","))
        }
        other => format!("{other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub(crate) fn value(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }
}

impl HostObject for Counter {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property_rw(
                "value",
                TypeDesc::Int,
                |c| Ok(c.value().into()),
                |c, v| {
                    let n = v
                        .as_value()
                        .and_then(Value::as_i64)
                        .ok_or_else(|| anyhow!("value must be an integer"))?;
                    c.value.store(n, Ordering::SeqCst);
                    Ok(())
                },
            )
            .method("increment", vec![], TypeDesc::Int, |c, _| {
                Ok((c.value.fetch_add(1, Ordering::SeqCst) + 1).into())
            })
            .async_method(
                "add_later",
                vec![
                    ParamInfo::new("amount", TypeDesc::Int),
                    ParamInfo::new("delay_ms", TypeDesc::Int),
                ],
                TypeDesc::Task(Some(Box::new(TypeDesc::Int))),
                |c, args| async move {
                    let amount = int_arg(&args, 0)?;
                    let delay = u64::try_from(int_arg(&args, 1)?)?;
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok((c.value.fetch_add(amount, Ordering::SeqCst) + amount).into())
                },
            )
            .build()
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

pub(crate) struct Calculator;

impl HostObject for Calculator {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::builder::<Self>()
            .method(
                "add",
                vec![ParamInfo::new("a", TypeDesc::Int), ParamInfo::new("b", TypeDesc::Int)],
                TypeDesc::Int,
                |_, args| Ok((int_arg(&args, 0)? + int_arg(&args, 1)?).into()),
            )
            .method(
                "collect",
                vec![
                    ParamInfo::new("a", TypeDesc::Any),
                    ParamInfo::new("b", TypeDesc::Any),
                    ParamInfo::variadic("rest", TypeDesc::Any),
                ],
                TypeDesc::String,
                |_, args| {
                    Ok(format!("a={} b={} rest={}", render(&args[0]), render(&args[1]), render(&args[2])).into())
                },
            )
            .method(
                "describe_args",
                vec![
                    ParamInfo::new("x", TypeDesc::Any),
                    ParamInfo::new("y", TypeDesc::Any),
                    ParamInfo::new("z", TypeDesc::Any),
                ],
                TypeDesc::String,
                |_, args| Ok(args.iter().map(render).collect::<Vec<_>>().join(",").into()),
            )
            .method("fail", vec![], TypeDesc::Void, |_, _| bail!("calculator failure"))
            .method("explode", vec![], TypeDesc::Void, |_, _| panic!("calculator exploded"))
            .build()
    }
}

// ---------------------------------------------------------------------------
// Settings / Profile
// ---------------------------------------------------------------------------

pub(crate) struct Profile {
    name: String,
    age: AtomicI64,
}

impl Profile {
    pub(crate) fn new(name: &str, age: i64) -> Self {
        Self {
            name: name.to_string(),
            age: AtomicI64::new(age),
        }
    }
}

impl HostObject for Profile {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property("name", TypeDesc::String, |p| Ok(p.name.clone().into()))
            .property_rw(
                "age",
                TypeDesc::Int,
                |p| Ok(p.age.load(Ordering::SeqCst).into()),
                |p, v| {
                    let n = v.as_value().and_then(Value::as_i64).ok_or_else(|| anyhow!("age must be an integer"))?;
                    p.age.store(n, Ordering::SeqCst);
                    Ok(())
                },
            )
            .build()
    }
}

pub(crate) struct Settings {
    title: Mutex<String>,
    profile: Arc<Profile>,
    formatter: Mutex<HostFunction>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: Mutex::new("untitled".to_string()),
            profile: Arc::new(Profile::new("grace", 85)),
            formatter: Mutex::new(HostFunction::sync(vec![TypeDesc::String], TypeDesc::String, |args| {
                Ok(format!("[{}]", render(&args[0])).into())
            })),
        }
    }
}

impl Settings {
    pub(crate) fn set_formatter(&self, formatter: HostFunction) {
        *self.formatter.lock() = formatter;
    }
}

impl HostObject for Settings {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::builder::<Self>()
            .property_rw(
                "title",
                TypeDesc::String,
                |s| Ok(s.title.lock().clone().into()),
                |s, v| {
                    let title = v.as_value().and_then(Value::as_str).ok_or_else(|| anyhow!("title must be a string"))?;
                    *s.title.lock() = title.to_string();
                    Ok(())
                },
            )
            .property("max_items", TypeDesc::Int, |_| Ok(10_i64.into()))
            .property("profile", TypeDesc::object_of::<Profile>(), |s| {
                Ok(HostValue::Object(s.profile.clone()))
            })
            .property(
                "formatter",
                TypeDesc::Delegate {
                    params: vec![TypeDesc::String],
                    returns: Box::new(TypeDesc::String),
                },
                |s| Ok(HostValue::Function(s.formatter.lock().clone())),
            )
            .property("secret_key", TypeDesc::String, |_| Ok("hunter2".into()))
            .ignore()
            .property("item", TypeDesc::Any, |_| Ok(HostValue::null()))
            .indexer()
            .property("kind", TypeDesc::TypeDescriptor, |_| Ok(HostValue::null()))
            .property("backing_field", TypeDesc::Int, |_| Ok(0_i64.into()))
            .special()
            .method("rename", vec![ParamInfo::new("title", TypeDesc::String)], TypeDesc::Void, |s, args| {
                let title = args[0].as_value().and_then(Value::as_str).unwrap_or_default();
                *s.title.lock() = title.to_string();
                Ok(HostValue::null())
            })
            .method("secret", vec![], TypeDesc::Void, |_, _| Ok(HostValue::null()))
            .ignore()
            .method("drop", vec![], TypeDesc::Void, |_, _| Ok(HostValue::null()))
            .special()
            .method("type_token", vec![], TypeDesc::TypeDescriptor, |_, _| Ok(HostValue::null()))
            .method("current_profile", vec![], TypeDesc::object_of::<Profile>(), |s, _| {
                Ok(HostValue::Object(Arc::new(Profile::new(&s.profile.name, s.profile.age.load(Ordering::SeqCst)))))
            })
            .method("snapshot", vec![], TypeDesc::object_of::<Settings>(), |_, _| {
                Ok(HostValue::object(Settings::default()))
            })
            .build()
    }
}
