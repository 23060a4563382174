// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The consuming half of the command pipeline.

use super::callback::CallbackTable;
use super::commands::{DriverCommand, StreamRange, RECORD_HEADER_SIZE, TAG_COMMAND, TAG_INLINE};
use super::queue::CommandBuffer;
use crate::driver::{Backend, Driver};
use std::sync::Arc;

/// Replays command batches against a [`Driver`].
///
/// Owned by the driver thread, or by the engine itself when it runs
/// single-threaded. Nothing else may touch the driver.
pub struct CommandExecutor {
    driver: Box<dyn Driver>,
    callbacks: Arc<CallbackTable>,
    commands_executed: u64,
}

impl CommandExecutor {
    /// Wraps a driver freshly returned by its platform.
    pub fn new(driver: Box<dyn Driver>, callbacks: Arc<CallbackTable>) -> Self {
        Self {
            driver,
            callbacks,
            commands_executed: 0,
        }
    }

    /// The backend of the wrapped driver.
    pub fn backend(&self) -> Backend {
        self.driver.backend()
    }

    /// Number of commands replayed so far.
    pub fn commands_executed(&self) -> u64 {
        self.commands_executed
    }

    /// Replays every command of `buffer`, in recording order.
    ///
    /// # Panics
    ///
    /// Panics if the batch is malformed. Batches are only produced by
    /// [`super::CommandStream`], so a malformed batch means memory corruption.
    pub fn execute(&mut self, buffer: &CommandBuffer) {
        let bytes = buffer.as_bytes();
        let mut cursor = 0;
        while cursor < bytes.len() {
            if cursor + RECORD_HEADER_SIZE > bytes.len() {
                corrupt(buffer, cursor, "truncated record header");
            }
            let tag = bytes[cursor];
            let mut len = [0u8; 4];
            len.copy_from_slice(&bytes[cursor + 1..cursor + RECORD_HEADER_SIZE]);
            let start = cursor + RECORD_HEADER_SIZE;
            let end = start + u32::from_le_bytes(len) as usize;
            if end > bytes.len() {
                corrupt(buffer, cursor, "record past end of batch");
            }

            match tag {
                TAG_INLINE => {}
                TAG_COMMAND => {
                    let decoded = bincode::serde::decode_from_slice::<DriverCommand, _>(
                        &bytes[start..end],
                        bincode::config::standard(),
                    );
                    match decoded {
                        Ok((command, _)) => self.dispatch(bytes, command),
                        Err(_) => corrupt(buffer, cursor, "undecodable command"),
                    }
                }
                _ => corrupt(buffer, cursor, "unknown record tag"),
            }
            cursor = end;
        }
    }

    fn dispatch(&mut self, bytes: &[u8], command: DriverCommand) {
        self.commands_executed += 1;
        let driver = self.driver.as_mut();
        match command {
            DriverCommand::Purge => driver.purge(),
            DriverCommand::CreateBuffer {
                handle,
                usage,
                size,
            } => driver.create_buffer(handle, usage, size),
            DriverCommand::UpdateBuffer {
                handle,
                offset,
                data,
            } => driver.update_buffer(handle, offset, slice(bytes, data)),
            DriverCommand::DestroyBuffer { handle } => driver.destroy_buffer(handle),
            DriverCommand::CreateTexture { handle, info } => driver.create_texture(handle, &info),
            DriverCommand::UpdateTexture {
                handle,
                level,
                data,
            } => driver.update_texture(handle, level, slice(bytes, data)),
            DriverCommand::DestroyTexture { handle } => driver.destroy_texture(handle),
            DriverCommand::CreateProgram { handle, name } => driver.create_program(handle, &name),
            DriverCommand::DestroyProgram { handle } => driver.destroy_program(handle),
            DriverCommand::CreateRenderPrimitive { handle, info } => {
                driver.create_render_primitive(handle, &info)
            }
            DriverCommand::DestroyRenderPrimitive { handle } => {
                driver.destroy_render_primitive(handle)
            }
            DriverCommand::CreateRenderTarget { handle, info } => {
                driver.create_render_target(handle, &info)
            }
            DriverCommand::DestroyRenderTarget { handle } => driver.destroy_render_target(handle),
            DriverCommand::CreateSwapChain {
                handle,
                native_window,
                flags,
            } => driver.create_swap_chain(handle, native_window, flags),
            DriverCommand::DestroySwapChain { handle } => driver.destroy_swap_chain(handle),
            DriverCommand::CreateStream {
                handle,
                width,
                height,
            } => driver.create_stream(handle, width, height),
            DriverCommand::DestroyStream { handle } => driver.destroy_stream(handle),
            DriverCommand::CreateFence { handle } => driver.create_fence(handle),
            DriverCommand::DestroyFence { handle } => driver.destroy_fence(handle),
            DriverCommand::Callback { id } => {
                if !self.callbacks.invoke(id) {
                    log::warn!("Driver callback {} was already consumed.", id);
                }
            }
        }
    }

    /// Shuts the driver down. Must be the last call made on this executor.
    pub fn terminate(&mut self) {
        self.driver.terminate();
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("backend", &self.driver.backend())
            .field("commands_executed", &self.commands_executed)
            .finish()
    }
}

fn slice(bytes: &[u8], range: StreamRange) -> &[u8] {
    match bytes.get(range.bounds()) {
        Some(data) => data,
        None => {
            log::error!("Inline data {:?} lies outside of its batch.", range);
            panic!("corrupt command stream: inline range {:?} out of bounds", range);
        }
    }
}

fn corrupt(buffer: &CommandBuffer, cursor: usize, reason: &str) -> ! {
    log::error!(
        "Corrupt command batch #{} at byte {}: {}.",
        buffer.sequence(),
        cursor,
        reason
    );
    panic!("corrupt command stream: {}", reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandBufferQueue, CommandStream};
    use crate::driver::*;
    use std::sync::Mutex;

    /// Records the name of every driver call it receives.
    struct RecordingDriver {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingDriver {
        fn push(&self, entry: String) {
            self.log.lock().unwrap().push(entry);
        }
    }

    impl Driver for RecordingDriver {
        fn backend(&self) -> Backend {
            Backend::Noop
        }
        fn create_buffer(&mut self, handle: BufferHandle, usage: BufferUsage, size: u32) {
            self.push(format!("create_buffer {} {:?} {}", handle.0, usage, size));
        }
        fn update_buffer(&mut self, handle: BufferHandle, offset: u32, data: &[u8]) {
            self.push(format!("update_buffer {} {} {:?}", handle.0, offset, data));
        }
        fn destroy_buffer(&mut self, handle: BufferHandle) {
            self.push(format!("destroy_buffer {}", handle.0));
        }
        fn create_texture(&mut self, handle: TextureHandle, info: &TextureInfo) {
            self.push(format!("create_texture {} {}x{}", handle.0, info.width, info.height));
        }
        fn update_texture(&mut self, handle: TextureHandle, level: u8, data: &[u8]) {
            self.push(format!("update_texture {} {} {}", handle.0, level, data.len()));
        }
        fn destroy_texture(&mut self, handle: TextureHandle) {
            self.push(format!("destroy_texture {}", handle.0));
        }
        fn create_program(&mut self, handle: ProgramHandle, name: &str) {
            self.push(format!("create_program {} {}", handle.0, name));
        }
        fn destroy_program(&mut self, handle: ProgramHandle) {
            self.push(format!("destroy_program {}", handle.0));
        }
        fn create_render_primitive(&mut self, handle: RenderPrimitiveHandle, _: &RenderPrimitiveInfo) {
            self.push(format!("create_render_primitive {}", handle.0));
        }
        fn destroy_render_primitive(&mut self, handle: RenderPrimitiveHandle) {
            self.push(format!("destroy_render_primitive {}", handle.0));
        }
        fn create_render_target(&mut self, handle: RenderTargetHandle, _: &RenderTargetInfo) {
            self.push(format!("create_render_target {}", handle.0));
        }
        fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
            self.push(format!("destroy_render_target {}", handle.0));
        }
        fn create_swap_chain(&mut self, handle: SwapChainHandle, _: u64, _: u64) {
            self.push(format!("create_swap_chain {}", handle.0));
        }
        fn destroy_swap_chain(&mut self, handle: SwapChainHandle) {
            self.push(format!("destroy_swap_chain {}", handle.0));
        }
        fn create_stream(&mut self, handle: StreamHandle, _: u32, _: u32) {
            self.push(format!("create_stream {}", handle.0));
        }
        fn destroy_stream(&mut self, handle: StreamHandle) {
            self.push(format!("destroy_stream {}", handle.0));
        }
        fn create_fence(&mut self, handle: FenceHandle) {
            self.push(format!("create_fence {}", handle.0));
        }
        fn destroy_fence(&mut self, handle: FenceHandle) {
            self.push(format!("destroy_fence {}", handle.0));
        }
        fn purge(&mut self) {
            self.push("purge".to_owned());
        }
        fn terminate(&mut self) {
            self.push("terminate".to_owned());
        }
    }

    fn pipeline() -> (CommandStream, CommandExecutor, Arc<Mutex<Vec<String>>>) {
        let queue = Arc::new(CommandBufferQueue::single_threaded(256, 4096));
        let callbacks = Arc::new(CallbackTable::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let driver = RecordingDriver { log: Arc::clone(&log) };
        let stream = CommandStream::new(queue, Arc::clone(&callbacks));
        let executor = CommandExecutor::new(Box::new(driver), callbacks);
        (stream, executor, log)
    }

    fn drain(stream: &CommandStream, executor: &mut CommandExecutor) {
        for buffer in stream.queue().wait_for_commands() {
            executor.execute(&buffer);
            stream.queue().release_buffer(buffer);
        }
    }

    #[test]
    fn test_commands_replay_in_recording_order() {
        let (mut stream, mut executor, log) = pipeline();

        let buffer = stream.create_buffer(BufferUsage::Vertex, 12);
        stream.update_buffer(buffer, 4, &[7, 8, 9]);
        let program = stream.create_program("unlit");
        stream.destroy_buffer(buffer);
        stream.flush();
        drain(&stream, &mut executor);

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                format!("create_buffer {} Vertex 12", buffer.0),
                format!("update_buffer {} 4 [7, 8, 9]", buffer.0),
                format!("create_program {} unlit", program.0),
                format!("destroy_buffer {}", buffer.0),
                "purge".to_owned(),
            ]
        );
        assert_eq!(executor.commands_executed(), 5);
    }

    #[test]
    fn test_callbacks_run_after_preceding_commands() {
        let (mut stream, mut executor, log) = pipeline();
        let callback_log = Arc::clone(&log);

        stream.create_fence();
        stream.queue_callback(move || callback_log.lock().unwrap().push("signaled".to_owned()));
        stream.flush();
        assert_eq!(stream.callbacks().len(), 1);
        drain(&stream, &mut executor);

        let log = log.lock().unwrap();
        assert_eq!(log[1], "signaled");
        assert!(stream.callbacks().is_empty());
    }

    #[test]
    fn test_allocated_range_is_aligned_and_replayed() {
        let (mut stream, mut executor, log) = pipeline();
        let buffer = stream.create_buffer(BufferUsage::Index, 8);

        let range = stream.allocate(8, 16).expect("range should fit");
        assert_eq!(range.offset % 16, 0);
        stream.range_mut(range).copy_from_slice(&[1, 0, 2, 0, 3, 0, 4, 0]);
        stream.update_buffer_range(buffer, 0, range);
        stream.flush();
        drain(&stream, &mut executor);

        let log = log.lock().unwrap();
        assert_eq!(log[1], format!("update_buffer {} 0 [1, 0, 2, 0, 3, 0, 4, 0]", buffer.0));
    }

    #[test]
    fn test_allocate_rejects_bad_requests() {
        let (mut stream, _, _) = pipeline();
        assert!(stream.allocate(16, 3).is_none());
        assert!(stream.allocate(8192, 1).is_none());
        assert_eq!(stream.pending_bytes(), 0);
    }

    #[test]
    fn test_empty_flush_records_no_purge() {
        let (mut stream, _, _) = pipeline();
        stream.flush();
        assert_eq!(stream.queue().pending_count(), 0);
    }
}
