// SPDX-License-Identifier: MPL-2.0
//! Native methods of `com.codefun.media.FFMediaPlayer`.
//!
//! Every export forwards to the [`handle`](crate::handle) surface. Decoder
//! messages are delivered back to the Java object through its
//! `playerEventCallback(int, float)` method, from whichever decode thread
//! produced them.
//!
//! The static surface natives carry a render type, as the Java API does,
//! but every mode draws from the same latest-frame surface, so it is only
//! logged.

use crate::config::{self, PlayerConfig};
use crate::decoder::{DecoderMessage, MessageSink};
use crate::handle;
use crate::logging;
use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::{jfloat, jint, jlong};
use jni::{JNIEnv, JavaVM};
use log::{error, trace, warn};
use std::sync::OnceLock;

const EVENT_CALLBACK: &str = "playerEventCallback";
const EVENT_CALLBACK_SIG: &str = "(IF)V";

fn config() -> &'static PlayerConfig {
    static CONFIG: OnceLock<PlayerConfig> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let loaded = config::load();
        let config = loaded.clone().unwrap_or_default();
        logging::init(&config.logging);
        if let Err(e) = loaded {
            warn!("player config unreadable, using defaults: {}", e);
        } else if config::config_path().is_some_and(|path| !path.exists()) {
            // Seed the file so the host has something to edit.
            if let Err(e) = config::save(&config) {
                warn!("could not write default player config: {}", e);
            }
        }
        config
    })
}

fn deliver(vm: &JavaVM, target: &GlobalRef, message: DecoderMessage) -> jni::errors::Result<()> {
    // Decode threads stay attached until they exit.
    let mut env = vm.attach_current_thread_permanently()?;
    let result = env.call_method(
        target.as_obj(),
        EVENT_CALLBACK,
        EVENT_CALLBACK_SIG,
        &[JValue::Int(message.code()), JValue::Float(message.value())],
    );
    if env.exception_check()? {
        env.exception_clear()?;
    }
    result.map(|_| ())
}

fn event_sink(env: &mut JNIEnv<'_>, this: &JObject<'_>) -> jni::errors::Result<MessageSink> {
    let vm = env.get_java_vm()?;
    let target = env.new_global_ref(this)?;
    Ok(MessageSink::new(move |message| {
        if let Err(e) = deliver(&vm, &target, message) {
            warn!("failed to deliver {:?} to Java: {}", message, e);
        }
    }))
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1Init<'local>(
    mut env: JNIEnv<'local>,
    this: JObject<'local>,
    url: JString<'local>,
    render_type: jint,
) -> jlong {
    let config = config();
    let locator: String = match env.get_string(&url) {
        Ok(locator) => locator.into(),
        Err(e) => {
            error!("native_Init: unreadable url: {}", e);
            return handle::NULL_HANDLE;
        }
    };
    let messages = event_sink(&mut env, &this).unwrap_or_else(|e| {
        warn!("native_Init: player events disabled: {}", e);
        MessageSink::none()
    });
    handle::create(&locator, render_type, config, messages)
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1Play<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
) {
    handle::play(player_handle);
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1SeekToPosition<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
    position: jfloat,
) {
    handle::seek(player_handle, position);
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1Pause<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
) {
    handle::pause(player_handle);
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1Stop<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
) {
    handle::stop(player_handle);
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1UnInit<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
) {
    handle::teardown(player_handle);
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1GetMediaParams<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    player_handle: jlong,
    param_type: jint,
) -> jlong {
    handle::get_media_params(player_handle, param_type)
}

fn surface_dimension(value: jint) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1OnSurfaceCreated<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    render_type: jint,
) {
    trace!("surface created (render type {})", render_type);
    handle::surface_created();
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1OnSurfaceChanged<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    render_type: jint,
    width: jint,
    height: jint,
) {
    trace!("surface changed (render type {})", render_type);
    handle::surface_changed(surface_dimension(width), surface_dimension(height));
}

#[no_mangle]
pub extern "system" fn Java_com_codefun_media_FFMediaPlayer_native_1OnDrawFrame<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    render_type: jint,
) {
    if let Some(frame) = handle::draw_frame() {
        trace!(
            "drawing {}x{} frame (render type {})",
            frame.width,
            frame.height,
            render_type
        );
    }
}
